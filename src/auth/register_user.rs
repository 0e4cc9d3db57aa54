//! Handles requests to create a new account.

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::{
    Error, aggregate_validation_errors,
    auth::{
        AuthResponse, AuthState, NewUser, PasswordHash, UserProfile, ValidatedPassword,
        normalize_email,
    },
};

/// The body of a registration request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The display name.
    pub name: Option<String>,
    /// The email address used to log in.
    pub email: Option<String>,
    /// The plaintext password.
    pub password: Option<String>,
}

/// A route handler for creating a new user.
///
/// Responds with `201 Created` and an [AuthResponse], so the client is signed in straight away.
///
/// # Errors
/// - [Error::Validation] listing every missing or invalid field.
/// - [Error::DuplicateEmail] if the email is already registered.
pub async fn register_user(
    State(state): State<AuthState>,
    WithRejection(Json(form), _): WithRejection<Json<RegisterForm>, Error>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let mut messages: Vec<String> = Vec::new();

    let name = form.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        messages.push("Please add a name".to_owned());
    }

    let email = match form.email.as_deref().map(str::trim) {
        None | Some("") => {
            messages.push("Please add an email".to_owned());
            None
        }
        Some(raw_email) => {
            let email = normalize_email(raw_email);
            if email.is_none() {
                messages.push("Please add a valid email".to_owned());
            }
            email
        }
    };

    let password = match form.password.as_deref() {
        None | Some("") => {
            messages.push("Please add a password".to_owned());
            None
        }
        Some(raw_password) => match ValidatedPassword::new(raw_password) {
            Ok(password) => Some(password),
            Err(Error::Validation(message)) => {
                messages.push(message);
                None
            }
            Err(error) => return Err(error),
        },
    };

    aggregate_validation_errors(messages)?;

    let (Some(email), Some(password)) = (email, password) else {
        return Err(Error::Validation("Please add all fields".to_owned()));
    };

    match state.user_store.get_user_by_email(&email) {
        Ok(_) => return Err(Error::DuplicateEmail),
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let cost = state.auth_config.password_cost;
    let password_hash = tokio::task::spawn_blocking(move || PasswordHash::new(password, cost))
        .await
        .map_err(|error| Error::HashingError(error.to_string()))??;

    let user = state.user_store.create_user(NewUser {
        name: name.to_owned(),
        email,
        password_hash,
    })?;
    let token = state.auth_config.token_config.encode(user.id)?;

    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserProfile::from(&user),
        }),
    ))
}
