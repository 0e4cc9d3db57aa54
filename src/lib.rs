//! A personal finance tracker.
//!
//! This library provides a JSON REST API for registering users, signing in
//! with bearer tokens and managing income/expense transactions, plus a small
//! HTTP client that keeps the signed-in session on disk.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
pub mod client;
mod config;
mod database_id;
mod db;
pub mod endpoints;
mod logging;
mod routing;
mod stores;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    AuthConfig, AuthResponse, NewUser, PasswordHash, TokenConfig, User, UserID, UserProfile,
    ValidatedPassword,
};
pub use config::{ConfigError, ServerConfig};
pub use database_id::{DatabaseId, TransactionId};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use stores::{
    MemoryStore, SQLiteStore, StoreKind, Stores, TransactionStore, UserStore,
};
pub use transaction::{Transaction, TransactionPatch, TransactionRequest, ValidatedTransaction};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields failed validation.
    ///
    /// The string holds every violated field message joined with ", ", so the
    /// client can show all problems at once.
    #[error("{0}")]
    Validation(String),

    /// The email used to register is already taken by another user.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// The email/password combination did not match a registered user.
    ///
    /// Unknown emails and wrong passwords both map to this variant so that
    /// clients cannot probe which emails are registered.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The bearer token was missing, malformed, expired or had a bad signature.
    #[error("not authorized")]
    Unauthorized,

    /// The requested resource was not found.
    ///
    /// Transactions owned by another user are also reported as not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The signing library could not create a token.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the lock guarding a store.
    #[error("could not acquire the store lock")]
    StoreLock,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message),
            Error::DuplicateEmail => (StatusCode::BAD_REQUEST, "User already exists".to_owned()),
            Error::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_owned())
            }
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authorized".to_owned()),
            Error::NotFound => (StatusCode::NOT_FOUND, "Transaction not found".to_owned()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_owned())
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Join field validation messages into a single error, or `Ok` if there are none.
pub(crate) fn aggregate_validation_errors<S: AsRef<str>>(messages: Vec<S>) -> Result<(), Error> {
    if messages.is_empty() {
        return Ok(());
    }

    let messages: Vec<&str> = messages.iter().map(AsRef::as_ref).collect();

    Err(Error::Validation(messages.join(", ")))
}
