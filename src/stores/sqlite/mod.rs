//! Implements the user and transaction stores on top of a SQLite database.

mod transaction;
mod user;

pub(crate) use transaction::SQLiteTransactionTable;
pub(crate) use user::SQLiteUserTable;

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use email_address::EmailAddress;
use rusqlite::{Connection, types::Type};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::{NewUser, User, UserID},
    database_id::TransactionId,
    db::initialize,
    stores::{TransactionStore, UserStore},
    transaction::{Transaction, ValidatedTransaction},
};

/// Stores users and transactions in a SQLite database.
///
/// The connection is shared behind a mutex, so clones of this store all talk to the same database.
#[derive(Debug, Clone)]
pub struct SQLiteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteStore {
    /// Open (or create) the database file at `path` and set up the tables.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the file cannot be opened or the tables cannot be created,
    /// e.g. because the parent directory does not exist.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let connection = Connection::open(path)?;

        Self::new(connection)
    }

    /// Use an already open `connection`, creating the tables if they do not exist.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the tables cannot be created.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        connection.pragma_update(None, "foreign_keys", "ON")?;
        initialize(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|error| {
            tracing::error!("Database connection lock is poisoned: {error}");
            Error::StoreLock
        })
    }
}

impl UserStore for SQLiteStore {
    fn create_user(&self, user: NewUser) -> Result<User, Error> {
        let connection = self.lock()?;
        SQLiteUserTable::insert(&connection, user)
    }

    fn get_user_by_email(&self, email: &EmailAddress) -> Result<User, Error> {
        let connection = self.lock()?;
        SQLiteUserTable::select_by_email(&connection, email)
    }
}

impl TransactionStore for SQLiteStore {
    fn create_transaction(
        &self,
        owner: UserID,
        transaction: ValidatedTransaction,
    ) -> Result<Transaction, Error> {
        let connection = self.lock()?;
        SQLiteTransactionTable::insert(&connection, owner, transaction)
    }

    fn get_transaction(&self, owner: UserID, id: TransactionId) -> Result<Transaction, Error> {
        let connection = self.lock()?;
        SQLiteTransactionTable::select(&connection, owner, id)
    }

    fn list_transactions(&self, owner: UserID) -> Result<Vec<Transaction>, Error> {
        let connection = self.lock()?;
        SQLiteTransactionTable::select_all(&connection, owner)
    }

    fn update_transaction(
        &self,
        owner: UserID,
        id: TransactionId,
        transaction: ValidatedTransaction,
    ) -> Result<Transaction, Error> {
        let connection = self.lock()?;
        SQLiteTransactionTable::update(&connection, owner, id, transaction)
    }

    fn delete_transaction(&self, owner: UserID, id: TransactionId) -> Result<(), Error> {
        let connection = self.lock()?;
        SQLiteTransactionTable::delete(&connection, owner, id)
    }
}

/// Convert a timestamp to the Unix milliseconds stored in the database.
pub(crate) fn to_unix_millis(date_time: OffsetDateTime) -> i64 {
    (date_time.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Read Unix milliseconds from column `index` back into a UTC timestamp.
pub(crate) fn from_unix_millis(millis: i64, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error)))
}
