//! Transactions: the income and expense records that belong to a user.
//!
//! This module contains:
//! - The `Transaction` model and the request payloads for creating and editing transactions
//! - The validation rules shared by create and update
//! - The route handlers for the `/api/transactions` endpoints

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{AppState, Error, database_id::TransactionId, stores::TransactionStore};

pub use core::{Transaction, TransactionPatch, TransactionRequest, ValidatedTransaction, now};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use get_endpoint::{get_transaction_endpoint, list_transactions_endpoint};

/// The state needed by the transaction route handlers.
#[derive(Clone)]
pub struct TransactionState {
    /// The store for managing transactions.
    pub transaction_store: Arc<dyn TransactionStore>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            transaction_store: state.stores.transaction_store.clone(),
        }
    }
}

/// Parse the `{transaction_id}` path segment.
///
/// An ID that is not an integer cannot refer to any transaction, so it is reported as
/// [Error::NotFound] rather than as a bad request.
fn parse_transaction_id(raw_id: &str) -> Result<TransactionId, Error> {
    raw_id.parse().map_err(|_| Error::NotFound)
}
