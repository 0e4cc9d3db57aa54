//! Registration, log-in and bearer token authentication.

mod log_in;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

use std::sync::Arc;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState,
    stores::{StoreKind, UserStore},
};

pub use log_in::{LogInForm, log_in};
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::{RegisterForm, register_user};
pub use token::{DEFAULT_TOKEN_DURATION, TokenConfig};
pub use user::{NewUser, User, UserID, UserProfile, normalize_email};

/// Settings for hashing passwords and minting tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// The keys and lifetime for bearer tokens.
    pub token_config: TokenConfig,
    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
}

impl AuthConfig {
    /// Sign tokens with `secret`, valid for `token_duration`, and hash passwords with
    /// [PasswordHash::DEFAULT_COST].
    pub fn new(secret: &str, token_duration: Duration) -> Self {
        Self {
            token_config: TokenConfig::new(secret, token_duration),
            password_cost: PasswordHash::DEFAULT_COST,
        }
    }

    /// Settings for an app backed by a store of `kind`.
    ///
    /// The memory store starts user IDs from 1 again after a restart, so with it tokens are
    /// signed with a secret unique to this process. Tokens from an earlier run are then
    /// rejected instead of resolving to whoever reuses the ID.
    pub fn for_store(secret: &str, token_duration: Duration, kind: StoreKind) -> Self {
        match kind {
            StoreKind::SQLite => Self::new(secret, token_duration),
            StoreKind::Memory => {
                let process_secret =
                    format!("{secret}:{}", OffsetDateTime::now_utc().unix_timestamp_nanos());
                Self::new(&process_secret, token_duration)
            }
        }
    }

    /// Use `cost` when hashing passwords instead of the default.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}

impl FromRef<AppState> for TokenConfig {
    fn from_ref(state: &AppState) -> Self {
        state.auth_config.token_config.clone()
    }
}

/// The state needed to register a user or log in.
#[derive(Clone)]
pub struct AuthState {
    /// The settings for hashing passwords and minting tokens.
    pub auth_config: AuthConfig,
    /// The store of registered users.
    pub user_store: Arc<dyn UserStore>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            auth_config: state.auth_config.clone(),
            user_store: state.stores.user_store.clone(),
        }
    }
}

/// The body returned by a successful registration or log-in: the token plus the user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The bearer token to send in the `Authorization` header.
    pub token: String,
    /// The signed-in user.
    #[serde(flatten)]
    pub user: UserProfile,
}

#[cfg(test)]
mod auth_config_tests {
    use time::Duration;

    use crate::{
        Error,
        auth::{AuthConfig, UserID},
        stores::StoreKind,
    };

    #[test]
    fn sqlite_tokens_survive_a_restart() {
        let before = AuthConfig::for_store("foobar", Duration::hours(1), StoreKind::SQLite);
        let token = before.token_config.encode(UserID::new(1)).unwrap();

        let after = AuthConfig::for_store("foobar", Duration::hours(1), StoreKind::SQLite);

        assert_eq!(after.token_config.decode(&token).unwrap().user_id, UserID::new(1));
    }

    #[test]
    fn memory_tokens_do_not_survive_a_restart() {
        let before = AuthConfig::for_store("foobar", Duration::hours(1), StoreKind::Memory);
        let token = before.token_config.encode(UserID::new(1)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1));

        let after = AuthConfig::for_store("foobar", Duration::hours(1), StoreKind::Memory);

        assert!(before.token_config.decode(&token).is_ok());
        assert_eq!(after.token_config.decode(&token), Err(Error::Unauthorized));
    }
}

#[cfg(test)]
mod auth_response_tests {
    use crate::auth::{AuthResponse, UserID, UserProfile};

    #[test]
    fn serializes_flat() {
        let response = AuthResponse {
            token: "abc".to_owned(),
            user: UserProfile {
                id: UserID::new(3),
                name: "Alice".to_owned(),
                email: "alice@example.com".to_owned(),
            },
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "token": "abc",
                "id": 3,
                "name": "Alice",
                "email": "alice@example.com",
            })
        );
    }
}
