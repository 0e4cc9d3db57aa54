//! The user model and the public profile returned to clients.

use std::fmt::Display;

use email_address::{EmailAddress, Options};
use serde::{Deserialize, Serialize};

use crate::auth::PasswordHash;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
///
/// This type deliberately does not implement `Serialize`, the password hash
/// must never be sent to a client. Use [UserProfile] for responses.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the store.
    pub id: UserID,
    /// The display name given at registration.
    pub name: String,
    /// The user's lower-case email address, unique across users.
    pub email: EmailAddress,
    /// The user's salted and hashed password.
    pub password_hash: PasswordHash,
}

/// The data needed to create a [User], before the store has assigned an ID.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The trimmed display name.
    pub name: String,
    /// The normalized email address.
    pub email: EmailAddress,
    /// The hashed password.
    pub password_hash: PasswordHash,
}

/// The public fields of a [User].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user's ID.
    pub id: UserID,
    /// The user's display name.
    pub name: String,
    /// The user's email address.
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
        }
    }
}

/// Trim and lower-case `raw_email`, then check that it is a valid address.
///
/// Returns `None` if the normalized string is not a plain email address. Display text such as
/// `Alice <alice@example.com>` is rejected.
pub fn normalize_email(raw_email: &str) -> Option<EmailAddress> {
    EmailAddress::parse_with_options(
        &raw_email.trim().to_lowercase(),
        Options::default().without_display_text(),
    )
    .ok()
}
