//! Helpers shared by the route handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use time::Duration;

use crate::{
    AppState, build_router, endpoints,
    auth::{AuthConfig, AuthResponse, UserID},
    database_id::TransactionId,
    stores::{MemoryStore, Stores, TransactionStore},
    transaction::{Transaction, ValidatedTransaction},
};

/// The secret used to sign tokens in tests.
pub(crate) const TEST_SECRET: &str = "test secret";

/// The password used by [register].
pub(crate) const TEST_PASSWORD: &str = "hunter2";

/// The lowest cost bcrypt accepts.
const TEST_PASSWORD_COST: u32 = 4;

/// Auth settings with the cheapest bcrypt cost so tests stay fast.
pub(crate) fn test_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_SECRET, Duration::hours(1)).with_password_cost(TEST_PASSWORD_COST)
}

/// An [AppState] backed by in-memory stores.
pub(crate) fn test_state() -> AppState {
    AppState::new(test_auth_config(), Stores::memory())
}

pub(crate) fn test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

/// Register a user with [TEST_PASSWORD] and return their token.
pub(crate) async fn register(server: &TestServer, email: &str) -> String {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({"name": "Test User", "email": email, "password": TEST_PASSWORD}))
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json::<AuthResponse>().token
}

/// POST `body` to the transactions endpoint and return the created transaction.
pub(crate) async fn create_transaction(server: &TestServer, token: &str, body: Value) -> Transaction {
    let response = server
        .post(endpoints::TRANSACTIONS)
        .authorization_bearer(token)
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);

    response.json::<Transaction>()
}

/// A [TransactionStore] that counts how many times it is called.
pub(crate) struct CountingTransactionStore {
    inner: MemoryStore,
    calls: AtomicUsize,
}

impl CountingTransactionStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl TransactionStore for CountingTransactionStore {
    fn create_transaction(
        &self,
        owner: UserID,
        transaction: ValidatedTransaction,
    ) -> Result<Transaction, crate::Error> {
        self.count();
        self.inner.create_transaction(owner, transaction)
    }

    fn get_transaction(&self, owner: UserID, id: TransactionId) -> Result<Transaction, crate::Error> {
        self.count();
        self.inner.get_transaction(owner, id)
    }

    fn list_transactions(&self, owner: UserID) -> Result<Vec<Transaction>, crate::Error> {
        self.count();
        self.inner.list_transactions(owner)
    }

    fn update_transaction(
        &self,
        owner: UserID,
        id: TransactionId,
        transaction: ValidatedTransaction,
    ) -> Result<Transaction, crate::Error> {
        self.count();
        self.inner.update_transaction(owner, id, transaction)
    }

    fn delete_transaction(&self, owner: UserID, id: TransactionId) -> Result<(), crate::Error> {
        self.count();
        self.inner.delete_transaction(owner, id)
    }
}
