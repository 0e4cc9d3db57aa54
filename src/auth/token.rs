//! Signed, time-bounded bearer tokens.
//!
//! Tokens are JSON Web Tokens signed with HS256. Validity depends only on the
//! signature and the expiry, there is no server-side revocation list.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// The default lifetime of a token.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(30);

/// The contents of a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub user_id: UserID,
    /// The time the token was issued as a Unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a Unix timestamp.
    pub exp: i64,
}

/// The keys and lifetime used to mint and verify tokens.
#[derive(Clone)]
pub struct TokenConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    duration: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

impl TokenConfig {
    /// Create the signing keys from `secret`. Tokens will be valid for `duration` after issue.
    pub fn new(secret: &str, duration: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            duration,
        }
    }

    /// Mint a token for `user_id` that expires after the configured duration.
    ///
    /// # Errors
    /// Returns [Error::TokenCreation] if the expiry is out of range or the token could not be
    /// signed.
    pub fn encode(&self, user_id: UserID) -> Result<String, Error> {
        let now = OffsetDateTime::now_utc();
        let expiry = now.checked_add(self.duration).ok_or_else(|| {
            Error::TokenCreation(format!("token expiry {} is out of range", self.duration))
        })?;
        let claims = Claims {
            user_id,
            iat: now.unix_timestamp(),
            exp: expiry.unix_timestamp(),
        };

        self.encode_claims(&claims)
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|error| Error::TokenCreation(error.to_string()))
    }

    /// Verify the signature and expiry of `token` and return its claims.
    ///
    /// # Errors
    /// Returns [Error::Unauthorized] if the token is malformed, expired or was signed with a
    /// different secret.
    pub fn decode(&self, token: &str) -> Result<Claims, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|error| {
                tracing::debug!("Rejected token: {error}");
                Error::Unauthorized
            })
    }
}
