//! A small HTTP client for the finance tracker API that remembers the signed-in user.
//!
//! [SessionCache] keeps the token and profile on disk between runs, and [ApiClient] attaches the
//! token to requests and forgets it as soon as the server rejects it.

mod api;
mod session;

pub use api::ApiClient;
pub use session::{Session, SessionCache};

/// The errors that may occur when talking to the API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The session file could not be read or written.
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),

    /// The session file or a response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server rejected the credentials or token. The cached session has been cleared.
    #[error("{0}")]
    Unauthorized(String),

    /// The request needs a signed-in user but there is no cached session.
    #[error("not logged in")]
    NotLoggedIn,

    /// The server returned an error response.
    #[error("{message} (HTTP {status})")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The `message` from the response body.
        message: String,
    },
}
