//! The on-disk cache of the signed-in user's token and profile.

use std::{
    fs,
    io::ErrorKind,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use crate::{auth::UserProfile, client::ClientError};

/// A signed-in user and their bearer token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The bearer token.
    pub token: String,
    /// The signed-in user.
    pub user: UserProfile,
}

/// The file layout: two entries, with the profile stored as a JSON string.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

/// The persisted session, read once at start up.
///
/// A file that is missing, unreadable as JSON, or holds only one of the two entries is treated
/// as signed out.
#[derive(Debug)]
pub struct SessionCache {
    path: PathBuf,
    session: Option<Session>,
}

impl SessionCache {
    /// Read the session stored at `path`.
    ///
    /// # Errors
    /// Returns [ClientError::Io] if the file exists but cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    session: None,
                });
            }
            Err(error) => return Err(error.into()),
        };

        let session = parse_session(&contents);
        if session.is_none() {
            tracing::debug!(
                "Session file {} is incomplete, starting signed out",
                path.display()
            );
        }

        Ok(Self { path, session })
    }

    /// Store `token` and `user` in memory and on disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&mut self, token: String, user: UserProfile) -> Result<(), ClientError> {
        let file = SessionFile {
            token: Some(token.clone()),
            user: Some(serde_json::to_string(&user)?),
        };

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;

        self.session = Some(Session { token, user });

        Ok(())
    }

    /// Forget the session and delete the file.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be deleted.
    pub fn clear(&mut self) -> Result<(), ClientError> {
        self.session = None;

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    /// The cached token, if signed in.
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }

    /// The cached profile, if signed in.
    pub fn user(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|session| &session.user)
    }

    /// Whether a token and profile are cached.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

fn parse_session(contents: &str) -> Option<Session> {
    let file: SessionFile = serde_json::from_str(contents).ok()?;
    let token = file.token.filter(|token| !token.is_empty())?;
    let user = serde_json::from_str(&file.user?).ok()?;

    Some(Session { token, user })
}
