use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use crate::{
    Error,
    auth::UserID,
    transaction::{TransactionState, parse_transaction_id},
};

/// A route handler for deleting one of the signed-in user's transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the ID does not refer to one of the user's transactions,
/// including one that was already deleted.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, Error> {
    let id = parse_transaction_id(&raw_id)?;

    state.transaction_store.delete_transaction(user_id, id)?;
    tracing::debug!("User {user_id} deleted transaction {id}");

    Ok(Json(json!({ "message": "Transaction deleted successfully" })))
}
