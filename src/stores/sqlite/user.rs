//! The SQLite table for users.

use email_address::EmailAddress;
use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::{NewUser, PasswordHash, User, UserID},
    db::{CreateTable, MapRow},
};

/// Queries for the `user` table.
pub(crate) struct SQLiteUserTable;

impl SQLiteUserTable {
    /// Insert `user` and return it with its new ID.
    ///
    /// # Errors
    /// Returns [Error::DuplicateEmail] if the email is already registered, or [Error::SqlError]
    /// for any other SQL error.
    pub(crate) fn insert(connection: &Connection, user: NewUser) -> Result<User, Error> {
        connection
            .prepare(
                "INSERT INTO user (name, email, password) VALUES (?1, ?2, ?3)
                 RETURNING id, name, email, password",
            )?
            .query_row(
                (
                    &user.name,
                    user.email.to_string(),
                    user.password_hash.as_ref(),
                ),
                Self::map_row,
            )
            .map_err(Error::from)
    }

    /// Get the user with the specified `email` address.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such user, or [Error::SqlError] for any other
    /// SQL error.
    pub(crate) fn select_by_email(
        connection: &Connection,
        email: &EmailAddress,
    ) -> Result<User, Error> {
        connection
            .prepare("SELECT id, name, email, password FROM user WHERE email = :email")?
            .query_row(&[(":email", &email.to_string())], Self::map_row)
            .map_err(Error::from)
    }
}

impl CreateTable for SQLiteUserTable {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL,
                    password TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserTable {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_id = row.get(offset)?;
        let name = row.get(offset + 1)?;
        let raw_email: String = row.get(offset + 2)?;
        let raw_password_hash: String = row.get(offset + 3)?;

        Ok(User {
            id: UserID::new(raw_id),
            name,
            email: EmailAddress::new_unchecked(raw_email),
            password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        })
    }
}
