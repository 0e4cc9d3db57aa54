//! The SQLite table for transactions.
//!
//! Dates are stored as Unix milliseconds so that rows sort chronologically with a plain
//! `ORDER BY`.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    database_id::TransactionId,
    db::{CreateTable, MapRow},
    stores::sqlite::{from_unix_millis, to_unix_millis},
    transaction::{Transaction, ValidatedTransaction, now},
};

const COLUMNS: &str = "id, user_id, title, amount, date, category, created_at, updated_at";

/// Queries for the `transaction` table.
///
/// Every query is filtered by the owning user, a row owned by someone else behaves as if it
/// does not exist.
pub(crate) struct SQLiteTransactionTable;

impl SQLiteTransactionTable {
    /// Insert a transaction owned by `owner`.
    ///
    /// # Errors
    /// Returns [Error::Unauthorized] if `owner` does not refer to a registered user, or
    /// [Error::SqlError] for any other SQL error.
    pub(crate) fn insert(
        connection: &Connection,
        owner: UserID,
        transaction: ValidatedTransaction,
    ) -> Result<Transaction, Error> {
        let timestamp = to_unix_millis(now());

        connection
            .prepare(&format!(
                "INSERT INTO \"transaction\" (user_id, title, amount, date, category, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 RETURNING {COLUMNS}"
            ))?
            .query_row(
                (
                    owner.as_i64(),
                    &transaction.title,
                    transaction.amount,
                    to_unix_millis(transaction.date),
                    &transaction.category,
                    timestamp,
                ),
                Self::map_row,
            )
            .map_err(|error| match error {
                // Code 787 occurs when a FOREIGN KEY constraint failed.
                // The token refers to a user that no longer exists.
                rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 787 => {
                    Error::Unauthorized
                }
                error => error.into(),
            })
    }

    /// Get the transaction `id` owned by `owner`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such transaction.
    pub(crate) fn select(
        connection: &Connection,
        owner: UserID,
        id: TransactionId,
    ) -> Result<Transaction, Error> {
        connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
            ))?
            .query_row((id, owner.as_i64()), Self::map_row)
            .map_err(Error::from)
    }

    /// Get all of `owner`'s transactions, newest date first and then by descending ID.
    pub(crate) fn select_all(
        connection: &Connection,
        owner: UserID,
    ) -> Result<Vec<Transaction>, Error> {
        connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\" WHERE user_id = ?1
                 ORDER BY date DESC, id DESC"
            ))?
            .query_map([owner.as_i64()], Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    /// Overwrite the fields of transaction `id` and refresh its `updated_at`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such transaction owned by `owner`.
    pub(crate) fn update(
        connection: &Connection,
        owner: UserID,
        id: TransactionId,
        transaction: ValidatedTransaction,
    ) -> Result<Transaction, Error> {
        connection
            .prepare(&format!(
                "UPDATE \"transaction\"
                 SET title = ?1, amount = ?2, date = ?3, category = ?4, updated_at = ?5
                 WHERE id = ?6 AND user_id = ?7
                 RETURNING {COLUMNS}"
            ))?
            .query_row(
                (
                    &transaction.title,
                    transaction.amount,
                    to_unix_millis(transaction.date),
                    &transaction.category,
                    to_unix_millis(now()),
                    id,
                    owner.as_i64(),
                ),
                Self::map_row,
            )
            .map_err(Error::from)
    }

    /// Delete transaction `id`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such transaction owned by `owner`.
    pub(crate) fn delete(
        connection: &Connection,
        owner: UserID,
        id: TransactionId,
    ) -> Result<(), Error> {
        let rows_affected = connection.execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
            (id, owner.as_i64()),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteTransactionTable {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    amount REAL NOT NULL,
                    date INTEGER NOT NULL,
                    category TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )",
            (),
        )?;

        connection.execute(
            "CREATE INDEX IF NOT EXISTS idx_transaction_user_date
                ON \"transaction\"(user_id, date DESC)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionTable {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let raw_user_id = row.get(offset + 1)?;
        let title = row.get(offset + 2)?;
        let amount = row.get(offset + 3)?;
        let date = from_unix_millis(row.get(offset + 4)?, offset + 4)?;
        let category = row.get(offset + 5)?;
        let created_at = from_unix_millis(row.get(offset + 6)?, offset + 6)?;
        let updated_at = from_unix_millis(row.get(offset + 7)?, offset + 7)?;

        Ok(Transaction {
            id,
            user_id: UserID::new(raw_user_id),
            title,
            amount,
            date,
            category,
            created_at,
            updated_at,
        })
    }
}

#[cfg(test)]
mod transaction_table_tests {
    use std::str::FromStr;

    use email_address::EmailAddress;
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        auth::{NewUser, PasswordHash, UserID},
        db::initialize,
        stores::sqlite::SQLiteUserTable,
        transaction::ValidatedTransaction,
    };

    use super::SQLiteTransactionTable;

    fn get_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .pragma_update(None, "foreign_keys", "ON")
            .unwrap();
        initialize(&connection).unwrap();

        connection
    }

    fn create_user(connection: &Connection, email: &str) -> UserID {
        SQLiteUserTable::insert(
            connection,
            NewUser {
                name: "Test".to_owned(),
                email: EmailAddress::from_str(email).unwrap(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
            },
        )
        .unwrap()
        .id
    }

    fn groceries(date: OffsetDateTime) -> ValidatedTransaction {
        ValidatedTransaction {
            title: "Groceries".to_owned(),
            amount: -150.0,
            date,
            category: "Food & Dining".to_owned(),
        }
    }

    #[test]
    fn insert_then_select_round_trips() {
        let connection = get_connection();
        let owner = create_user(&connection, "alice@example.com");

        let inserted = SQLiteTransactionTable::insert(
            &connection,
            owner,
            groceries(datetime!(2025-05-04 13:14:15.678 UTC)),
        )
        .unwrap();
        let selected = SQLiteTransactionTable::select(&connection, owner, inserted.id).unwrap();

        assert_eq!(inserted, selected);
        assert_eq!(selected.user_id, owner);
        assert_eq!(selected.amount, -150.0);
        assert_eq!(selected.date, datetime!(2025-05-04 13:14:15.678 UTC));
        assert_eq!(selected.created_at, selected.updated_at);
    }

    #[test]
    fn insert_for_unknown_user_is_unauthorized() {
        let connection = get_connection();

        let result = SQLiteTransactionTable::insert(
            &connection,
            UserID::new(999),
            groceries(datetime!(2025-01-01 0:00 UTC)),
        );

        assert_eq!(result, Err(Error::Unauthorized));
    }

    #[test]
    fn select_all_orders_by_date_then_id_descending() {
        let connection = get_connection();
        let owner = create_user(&connection, "alice@example.com");
        let insert = |date| {
            SQLiteTransactionTable::insert(&connection, owner, groceries(date))
                .unwrap()
                .id
        };
        let d1 = insert(datetime!(2025-01-01 0:00 UTC));
        let d3 = insert(datetime!(2025-03-01 0:00 UTC));
        let d2 = insert(datetime!(2025-02-01 0:00 UTC));
        let d2_again = insert(datetime!(2025-02-01 0:00 UTC));

        let ids: Vec<_> = SQLiteTransactionTable::select_all(&connection, owner)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.id)
            .collect();

        assert_eq!(ids, vec![d3, d2_again, d2, d1]);
    }

    #[test]
    fn queries_are_scoped_to_owner() {
        let connection = get_connection();
        let alice = create_user(&connection, "alice@example.com");
        let bob = create_user(&connection, "bob@example.com");
        let alices = SQLiteTransactionTable::insert(
            &connection,
            alice,
            groceries(datetime!(2025-01-01 0:00 UTC)),
        )
        .unwrap();

        assert_eq!(
            SQLiteTransactionTable::select(&connection, bob, alices.id),
            Err(Error::NotFound)
        );
        assert_eq!(
            SQLiteTransactionTable::select_all(&connection, bob),
            Ok(vec![])
        );
        assert_eq!(
            SQLiteTransactionTable::update(
                &connection,
                bob,
                alices.id,
                groceries(datetime!(2025-01-02 0:00 UTC))
            ),
            Err(Error::NotFound)
        );
        assert_eq!(
            SQLiteTransactionTable::delete(&connection, bob, alices.id),
            Err(Error::NotFound)
        );
        assert_eq!(
            SQLiteTransactionTable::select(&connection, alice, alices.id),
            Ok(alices)
        );
    }

    #[test]
    fn update_overwrites_fields() {
        let connection = get_connection();
        let owner = create_user(&connection, "alice@example.com");
        let inserted = SQLiteTransactionTable::insert(
            &connection,
            owner,
            groceries(datetime!(2025-01-01 0:00 UTC)),
        )
        .unwrap();
        // Timestamps have millisecond precision.
        std::thread::sleep(std::time::Duration::from_millis(5));

        let updated = SQLiteTransactionTable::update(
            &connection,
            owner,
            inserted.id,
            ValidatedTransaction {
                title: "Salary".to_owned(),
                amount: 4200.5,
                date: datetime!(2025-01-31 0:00 UTC),
                category: "Income".to_owned(),
            },
        )
        .unwrap();

        assert_eq!(updated.id, inserted.id);
        assert_eq!(updated.title, "Salary");
        assert_eq!(updated.amount, 4200.5);
        assert_eq!(updated.date, datetime!(2025-01-31 0:00 UTC));
        assert_eq!(updated.category, "Income");
        assert_eq!(updated.created_at, inserted.created_at);
        assert!(updated.updated_at > inserted.updated_at);
        assert_eq!(
            SQLiteTransactionTable::select(&connection, owner, inserted.id),
            Ok(updated)
        );
    }

    #[test]
    fn update_missing_transaction_is_not_found() {
        let connection = get_connection();
        let owner = create_user(&connection, "alice@example.com");

        assert_eq!(
            SQLiteTransactionTable::update(
                &connection,
                owner,
                42,
                groceries(datetime!(2025-01-01 0:00 UTC))
            ),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn second_delete_is_not_found() {
        let connection = get_connection();
        let owner = create_user(&connection, "alice@example.com");
        let inserted = SQLiteTransactionTable::insert(
            &connection,
            owner,
            groceries(datetime!(2025-01-01 0:00 UTC)),
        )
        .unwrap();

        assert_eq!(
            SQLiteTransactionTable::delete(&connection, owner, inserted.id),
            Ok(())
        );
        assert_eq!(
            SQLiteTransactionTable::delete(&connection, owner, inserted.id),
            Err(Error::NotFound)
        );
    }
}
