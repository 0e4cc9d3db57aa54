use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::{
    Error,
    auth::UserID,
    transaction::{Transaction, TransactionRequest, TransactionState},
};

/// A route handler for creating a new transaction owned by the signed-in user.
///
/// Responds with `201 Created` and the stored transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    WithRejection(Json(request), _): WithRejection<Json<TransactionRequest>, Error>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let transaction = request.validate()?;
    let transaction = state
        .transaction_store
        .create_transaction(user_id, transaction)?;

    tracing::debug!("User {user_id} created transaction {}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}
