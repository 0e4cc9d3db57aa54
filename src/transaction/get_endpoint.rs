use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error,
    auth::UserID,
    transaction::{Transaction, TransactionState, parse_transaction_id},
};

/// A route handler for listing the signed-in user's transactions, most recent first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Transaction>>, Error> {
    state
        .transaction_store
        .list_transactions(user_id)
        .map(Json)
}

/// A route handler for getting one of the signed-in user's transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the ID is not an integer or does not belong to the user.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(raw_id): Path<String>,
) -> Result<Json<Transaction>, Error> {
    let id = parse_transaction_id(&raw_id)?;

    state
        .transaction_store
        .get_transaction(user_id, id)
        .map(Json)
}
