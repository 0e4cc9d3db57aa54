//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::{auth_guard, log_in, register_user},
    endpoints,
    stores::StoreKind,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_endpoint, list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(log_in))
        .route(endpoints::HEALTH, get(get_health));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_health(State(store_kind): State<StoreKind>) -> Json<Value> {
    Json(json!({ "status": "ok", "store": store_kind }))
}

async fn get_404_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Not found" })),
    )
}

#[cfg(test)]
mod routing_tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState,
        endpoints::{self, format_endpoint},
        stores::{SQLiteStore, StoreKind, Stores},
        test_utils::{
            CountingTransactionStore, create_transaction, register, test_auth_config, test_server,
            test_state,
        },
        transaction::Transaction,
    };

    #[tokio::test]
    async fn health_reports_store_kind() {
        let server = test_server(test_state());

        let response = server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        response.assert_json(&json!({"status": "ok", "store": "memory"}));
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let server = test_server(test_state());

        let response = server.get("/api/nope").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({"message": "Not found"}));
    }

    #[tokio::test]
    async fn unauthorized_requests_never_reach_the_store() {
        let counting_store = Arc::new(CountingTransactionStore::new());
        let mut stores = Stores::memory();
        stores.transaction_store = counting_store.clone();
        let server = test_server(AppState::new(test_auth_config(), stores));
        let transaction_path = format_endpoint(endpoints::TRANSACTION, 1);
        let body = json!({"title": "Coffee", "amount": -4.5, "category": "Food"});

        let responses = [
            server.get(endpoints::TRANSACTIONS).await,
            server.post(endpoints::TRANSACTIONS).json(&body).await,
            server.get(&transaction_path).await,
            server.put(&transaction_path).json(&body).await,
            server.delete(&transaction_path).await,
            server
                .get(endpoints::TRANSACTIONS)
                .authorization_bearer("not.a.token")
                .await,
        ];

        for response in responses {
            response.assert_status(StatusCode::UNAUTHORIZED);
            response.assert_json(&json!({"message": "Not authorized"}));
        }
        assert_eq!(counting_store.calls(), 0);
    }

    #[tokio::test]
    async fn health_does_not_need_a_token() {
        let mut state = test_state();
        state.stores.kind = StoreKind::SQLite;
        let server = test_server(state);

        server
            .get(endpoints::HEALTH)
            .await
            .assert_json(&json!({"status": "ok", "store": "sqlite"}));
    }

    #[tokio::test]
    async fn sqlite_backed_router_serves_transactions() {
        let store = SQLiteStore::new(Connection::open_in_memory().unwrap()).unwrap();
        let server = test_server(AppState::new(test_auth_config(), Stores::sqlite(store)));
        let token = register(&server, "alice@example.com").await;
        let created = create_transaction(
            &server,
            &token,
            json!({"title": "Rent", "amount": -1200, "date": "2025-02-01", "category": "Housing"}),
        )
        .await;
        let transaction_path = format_endpoint(endpoints::TRANSACTION, created.id);

        let updated = server
            .put(&transaction_path)
            .authorization_bearer(&token)
            .json(&json!({"amount": -1250}))
            .await
            .json::<Transaction>();
        let listed = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await
            .json::<Vec<Transaction>>();
        server
            .delete(&transaction_path)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        assert_eq!(updated.amount, -1250.0);
        assert_eq!(listed, vec![updated]);
        server
            .get(&transaction_path)
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
