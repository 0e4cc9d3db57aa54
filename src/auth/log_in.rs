//! Handles log-in requests.

use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::{
    Error, aggregate_validation_errors,
    auth::{AuthResponse, AuthState, UserProfile, normalize_email},
};

/// The body of a log-in request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogInForm {
    /// The email address given at registration. Case is ignored.
    pub email: Option<String>,
    /// The plaintext password.
    pub password: Option<String>,
}

/// A route handler for exchanging an email and password for a bearer token.
///
/// # Errors
/// - [Error::Validation] if either field is missing.
/// - [Error::InvalidCredentials] if the email is not registered or the password does not match.
///   Both cases produce the same response.
pub async fn log_in(
    State(state): State<AuthState>,
    WithRejection(Json(form), _): WithRejection<Json<LogInForm>, Error>,
) -> Result<Json<AuthResponse>, Error> {
    let email = form.email.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    let mut messages = Vec::new();
    if email.trim().is_empty() {
        messages.push("Please add an email");
    }
    if password.is_empty() {
        messages.push("Please add a password");
    }
    aggregate_validation_errors(messages)?;

    let email = normalize_email(&email).ok_or(Error::InvalidCredentials)?;
    let user = match state.user_store.get_user_by_email(&email) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::debug!("Log-in attempt for unregistered email");
            return Err(Error::InvalidCredentials);
        }
        Err(error) => return Err(error),
    };

    let password_hash = user.password_hash.clone();
    let is_password_valid = tokio::task::spawn_blocking(move || password_hash.verify(&password))
        .await
        .map_err(|error| Error::HashingError(error.to_string()))?
        .map_err(|error| {
            tracing::error!("Could not verify password for user {}: {error}", user.id);
            Error::HashingError(error.to_string())
        })?;

    if !is_password_valid {
        tracing::debug!("Wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let token = state.auth_config.token_config.encode(user.id)?;

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(&user),
    }))
}
