//! Implements a struct that holds the state of the REST server.

use axum::extract::FromRef;

use crate::{
    auth::AuthConfig,
    stores::{StoreKind, Stores},
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The settings for hashing passwords and minting tokens.
    pub auth_config: AuthConfig,

    /// The user and transaction stores.
    pub stores: Stores,
}

impl AppState {
    /// Create a new [AppState].
    pub fn new(auth_config: AuthConfig, stores: Stores) -> Self {
        Self {
            auth_config,
            stores,
        }
    }
}

impl FromRef<AppState> for StoreKind {
    fn from_ref(state: &AppState) -> Self {
        state.stores.kind
    }
}
