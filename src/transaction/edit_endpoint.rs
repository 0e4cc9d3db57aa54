use axum::{
    Extension, Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;

use crate::{
    Error,
    auth::UserID,
    transaction::{Transaction, TransactionPatch, TransactionState, parse_transaction_id},
};

/// A route handler for updating one of the signed-in user's transactions.
///
/// Fields missing from the body keep their current values. The merged transaction must pass the
/// same validation as a new one.
///
/// # Errors
/// - [Error::NotFound] if the ID does not refer to one of the user's transactions.
/// - [Error::Validation] if the merged transaction is invalid.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(raw_id): Path<String>,
    WithRejection(Json(patch), _): WithRejection<Json<TransactionPatch>, Error>,
) -> Result<Json<Transaction>, Error> {
    let id = parse_transaction_id(&raw_id)?;
    let existing = state.transaction_store.get_transaction(user_id, id)?;
    let transaction = patch.merge(&existing)?;

    let updated = state
        .transaction_store
        .update_transaction(user_id, id, transaction)?;

    Ok(Json(updated))
}
