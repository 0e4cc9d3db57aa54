//! The HTTP client for the finance tracker API.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    auth::{AuthResponse, LogInForm, RegisterForm, UserProfile},
    client::{ClientError, SessionCache},
    database_id::TransactionId,
    endpoints::{self, format_endpoint},
    transaction::{Transaction, TransactionPatch, TransactionRequest},
};

/// Calls the API on behalf of the user in a [SessionCache].
///
/// The cached token is sent as a bearer token with every request. Any `401 Unauthorized`
/// response clears the cache before the error is returned.
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
    session: SessionCache,
}

impl ApiClient {
    /// Create a client for the server at `base_url`, e.g. `http://localhost:5000`.
    pub fn new(base_url: &str, session: SessionCache) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http_client: reqwest::Client::new(),
            session,
        }
    }

    /// The current session.
    pub fn session(&self) -> &SessionCache {
        &self.session
    }

    /// Create an account and sign in as the new user.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, ClientError> {
        let form = RegisterForm {
            name: Some(name.to_owned()),
            email: Some(email.to_owned()),
            password: Some(password.to_owned()),
        };
        let request = self.http_client.post(self.url(endpoints::REGISTER)).json(&form);
        let response: AuthResponse = self.send(request).await?;

        self.session
            .save(response.token, response.user.clone())?;

        Ok(response.user)
    }

    /// Sign in with an email and password.
    pub async fn log_in(&mut self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let form = LogInForm {
            email: Some(email.to_owned()),
            password: Some(password.to_owned()),
        };
        let request = self.http_client.post(self.url(endpoints::LOG_IN)).json(&form);
        let response: AuthResponse = self.send(request).await?;

        self.session
            .save(response.token, response.user.clone())?;

        Ok(response.user)
    }

    /// Forget the cached session.
    ///
    /// The server is not contacted, the token itself stays valid until it expires.
    pub fn log_out(&mut self) -> Result<(), ClientError> {
        self.session.clear()
    }

    /// List the user's transactions, most recent first.
    pub async fn list_transactions(&mut self) -> Result<Vec<Transaction>, ClientError> {
        let request = self.authorized(self.http_client.get(self.url(endpoints::TRANSACTIONS)))?;

        self.send(request).await
    }

    /// Get a single transaction.
    pub async fn get_transaction(&mut self, id: TransactionId) -> Result<Transaction, ClientError> {
        let url = self.url(&format_endpoint(endpoints::TRANSACTION, id));
        let request = self.authorized(self.http_client.get(url))?;

        self.send(request).await
    }

    /// Create a transaction.
    pub async fn create_transaction(
        &mut self,
        transaction: &TransactionRequest,
    ) -> Result<Transaction, ClientError> {
        let request = self.authorized(
            self.http_client
                .post(self.url(endpoints::TRANSACTIONS))
                .json(transaction),
        )?;

        self.send(request).await
    }

    /// Change some fields of a transaction.
    pub async fn update_transaction(
        &mut self,
        id: TransactionId,
        patch: &TransactionPatch,
    ) -> Result<Transaction, ClientError> {
        let url = self.url(&format_endpoint(endpoints::TRANSACTION, id));
        let request = self.authorized(self.http_client.put(url).json(patch))?;

        self.send(request).await
    }

    /// Delete a transaction and return the server's confirmation message.
    pub async fn delete_transaction(&mut self, id: TransactionId) -> Result<String, ClientError> {
        let url = self.url(&format_endpoint(endpoints::TRANSACTION, id));
        let request = self.authorized(self.http_client.delete(url))?;
        let body: Value = self.send(request).await?;

        Ok(message_from(&body).unwrap_or_default())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.session.token().ok_or(ClientError::NotLoggedIn)?;

        Ok(request.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&mut self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = message_from(&body).unwrap_or_else(|| status.to_string());

        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("Server rejected the session: {message}");
            self.session.clear()?;
            return Err(ClientError::Unauthorized(message));
        }

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn message_from(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
}
