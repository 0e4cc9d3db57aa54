/*! This module defines and implements traits for interacting with the application's SQLite database. */

use rusqlite::{Connection, Error, Row, Transaction as SqlTransaction};

use crate::stores::sqlite::{SQLiteTransactionTable, SQLiteUserTable};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create a table for the model if it does not already exist.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a concrete rust type.
pub trait MapRow {
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// **Note:** This function expects that the row object contains all the table columns in the order they were defined.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row(row: &Row) -> Result<Self::ReturnType, Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type starting at the column `offset`.
    ///
    /// # Errors
    /// Returns an error if a row item cannot be converted into the corresponding rust type, or if an invalid column index was used.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, Error>;
}

/// Create the all of the database tables for the application.
///
/// Tables that already exist are left untouched, so this is safe to call on
/// every start up.
///
/// # Errors
/// This function may return a [rusqlite::Error] if something went wrong creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    SQLiteUserTable::create_table(&transaction)?;
    SQLiteTransactionTable::create_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('user', 'transaction')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 2);
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert!(initialize(&connection).is_ok());
    }
}
