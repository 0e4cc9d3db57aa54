//! Contains traits and implementations for objects that store users and transactions.
//!
//! There are two backends: [SQLiteStore] persists to a database file, and [MemoryStore] keeps
//! everything in process memory and loses it on restart. [Stores::connect] picks one at start up.

use std::{path::Path, sync::Arc};

use email_address::EmailAddress;
use serde::Serialize;

use crate::{
    Error,
    auth::{NewUser, User, UserID},
    database_id::TransactionId,
    transaction::{Transaction, ValidatedTransaction},
};

mod memory;
pub(crate) mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SQLiteStore;

/// Handles the creation and retrieval of users.
pub trait UserStore: Send + Sync {
    /// Create a new user.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if another user already has the same email.
    fn create_user(&self, user: NewUser) -> Result<User, Error>;

    /// Get a user by their email.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no user with the given email exists.
    fn get_user_by_email(&self, email: &EmailAddress) -> Result<User, Error>;
}

/// Handles the creation, retrieval, update and deletion of transactions.
///
/// Every operation is scoped to the user `owner`. A transaction belonging to a different user
/// is treated exactly like one that does not exist.
pub trait TransactionStore: Send + Sync {
    /// Create a new transaction owned by `owner`.
    ///
    /// The store assigns the ID and sets both `created_at` and `updated_at`.
    fn create_transaction(
        &self,
        owner: UserID,
        transaction: ValidatedTransaction,
    ) -> Result<Transaction, Error>;

    /// Retrieve a single transaction.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` does not refer to a transaction owned by `owner`.
    fn get_transaction(&self, owner: UserID, id: TransactionId) -> Result<Transaction, Error>;

    /// Retrieve all of `owner`'s transactions, newest `date` first.
    ///
    /// Transactions with the same date are ordered by descending ID.
    fn list_transactions(&self, owner: UserID) -> Result<Vec<Transaction>, Error>;

    /// Replace the fields of an existing transaction and refresh its `updated_at`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` does not refer to a transaction owned by `owner`.
    fn update_transaction(
        &self,
        owner: UserID,
        id: TransactionId,
        transaction: ValidatedTransaction,
    ) -> Result<Transaction, Error>;

    /// Remove a transaction.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` does not refer to a transaction owned by `owner`,
    /// including when it has already been deleted.
    fn delete_transaction(&self, owner: UserID, id: TransactionId) -> Result<(), Error>;
}

/// Which storage backend is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Data is persisted to a SQLite database.
    SQLite,
    /// Data lives in process memory and is lost on restart.
    Memory,
}

/// The stores shared by the request handlers.
#[derive(Clone)]
pub struct Stores {
    /// The store for registered users.
    pub user_store: Arc<dyn UserStore>,
    /// The store for transactions.
    pub transaction_store: Arc<dyn TransactionStore>,
    /// The backend behind both stores.
    pub kind: StoreKind,
}

impl Stores {
    /// Open the SQLite database at `db_path`, falling back to an in-memory store if no path was
    /// given or the database could not be opened.
    pub fn connect(db_path: Option<&Path>) -> Self {
        let Some(db_path) = db_path else {
            tracing::warn!(
                "No database path configured. Using in-memory storage, data will be lost on restart."
            );
            return Self::memory();
        };

        match SQLiteStore::open(db_path) {
            Ok(store) => {
                tracing::info!("Using SQLite database at {}", db_path.display());
                Self::sqlite(store)
            }
            Err(error) => {
                tracing::warn!(
                    "Could not open database at {}: {error}. Using in-memory storage, data will be \
                    lost on restart.",
                    db_path.display()
                );
                Self::memory()
            }
        }
    }

    /// Use a fresh [MemoryStore] for both users and transactions.
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());

        Self {
            user_store: store.clone(),
            transaction_store: store,
            kind: StoreKind::Memory,
        }
    }

    /// Use `store` for both users and transactions.
    pub fn sqlite(store: SQLiteStore) -> Self {
        let store = Arc::new(store);

        Self {
            user_store: store.clone(),
            transaction_store: store,
            kind: StoreKind::SQLite,
        }
    }
}
