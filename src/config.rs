//! Command line and environment configuration for the server.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use axum::http::HeaderValue;
use clap::Parser;
use time::Duration;

use crate::auth::DEFAULT_TOKEN_DURATION;

/// The longest token lifetime the server accepts, roughly ten years.
pub const MAX_TOKEN_EXPIRY_DAYS: i64 = 3650;

/// Problems with the server configuration found at start up.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// The token signing secret is empty or only whitespace.
    #[error("the JWT secret must not be blank")]
    BlankSecret,

    /// Tokens must live for at least a day and at most [MAX_TOKEN_EXPIRY_DAYS].
    #[error(
        "the token expiry must be between 1 and {max} days, got {0}",
        max = MAX_TOKEN_EXPIRY_DAYS
    )]
    TokenExpiry(i64),

    /// A CORS origin is not a valid header value.
    #[error("invalid CORS origin {0:?}")]
    CorsOrigin(String),
}

/// The REST API server for the personal finance tracker.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct ServerConfig {
    /// File path to the SQLite database. If omitted or unusable, data is kept in memory.
    #[arg(long, env = "DATABASE_PATH")]
    pub db_path: Option<PathBuf>,

    /// The secret used to sign bearer tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// How many days a token stays valid after log-in.
    #[arg(long, env = "TOKEN_EXPIRY_DAYS", default_value_t = DEFAULT_TOKEN_DURATION.whole_days())]
    pub token_expiry_days: i64,

    /// The address to listen on.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// The file that receives debug level logs.
    #[arg(long, env = "LOG_PATH", default_value = "debug.log")]
    pub log_path: PathBuf,

    /// Origins allowed to call the API from a browser. Any origin is allowed if none are given.
    #[arg(long = "cors-origin", env = "CORS_ORIGIN", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Check the values clap cannot check by itself.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::BlankSecret);
        }

        if !(1..=MAX_TOKEN_EXPIRY_DAYS).contains(&self.token_expiry_days) {
            return Err(ConfigError::TokenExpiry(self.token_expiry_days));
        }

        self.cors_origins()?;

        Ok(())
    }

    /// The address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// How long a token stays valid.
    pub fn token_duration(&self) -> Duration {
        Duration::days(self.token_expiry_days)
    }

    /// The allowed CORS origins as header values.
    ///
    /// # Errors
    /// Returns [ConfigError::CorsOrigin] for the first origin that is not a valid header value.
    pub fn cors_origins(&self) -> Result<Vec<HeaderValue>, ConfigError> {
        self.cors_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim())
                    .map_err(|_| ConfigError::CorsOrigin(origin.to_owned()))
            })
            .collect()
    }
}
