//! The API endpoint URIs, shared by the router and the client.
//!
//! For endpoints that take a parameter, e.g. '/api/transactions/{transaction_id}', use
//! [format_endpoint].

use std::fmt::Display;

/// The route for creating an account.
pub const REGISTER: &str = "/api/auth/register";
/// The route for exchanging an email and password for a token.
pub const LOG_IN: &str = "/api/auth/login";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to get, update and delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for checking that the server is up and which store it is using.
pub const HEALTH: &str = "/api/health";

/// Replace the first `{parameter}` in `endpoint_path` with `id`.
///
/// If `endpoint_path` has no parameter it is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: impl Display) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| start + offset + 1);

    format!("{}{id}{}", &endpoint_path[..start], &endpoint_path[end..])
}
