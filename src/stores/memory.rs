//! Implements a store that keeps users and transactions in process memory.

use std::sync::{Mutex, MutexGuard};

use email_address::EmailAddress;

use crate::{
    Error,
    auth::{NewUser, User, UserID},
    database_id::TransactionId,
    stores::{TransactionStore, UserStore},
    transaction::{Transaction, ValidatedTransaction, now},
};

#[derive(Debug)]
struct MemoryState {
    users: Vec<User>,
    transactions: Vec<Transaction>,
    next_user_id: i64,
    next_transaction_id: TransactionId,
}

/// Stores users and transactions in memory. Everything is lost when the process exits.
///
/// IDs are assigned sequentially starting from 1.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                users: Vec::new(),
                transactions: Vec::new(),
                next_user_id: 1,
                next_transaction_id: 1,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, Error> {
        self.state.lock().map_err(|error| {
            tracing::error!("Memory store lock is poisoned: {error}");
            Error::StoreLock
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for MemoryStore {
    fn create_user(&self, user: NewUser) -> Result<User, Error> {
        let mut state = self.lock()?;

        if state.users.iter().any(|existing| existing.email == user.email) {
            return Err(Error::DuplicateEmail);
        }

        let user = User {
            id: UserID::new(state.next_user_id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
        };
        state.next_user_id += 1;
        state.users.push(user.clone());

        Ok(user)
    }

    fn get_user_by_email(&self, email: &EmailAddress) -> Result<User, Error> {
        self.lock()?
            .users
            .iter()
            .find(|user| &user.email == email)
            .cloned()
            .ok_or(Error::NotFound)
    }
}

impl TransactionStore for MemoryStore {
    fn create_transaction(
        &self,
        owner: UserID,
        transaction: ValidatedTransaction,
    ) -> Result<Transaction, Error> {
        let mut state = self.lock()?;
        let timestamp = now();

        let transaction = Transaction {
            id: state.next_transaction_id,
            user_id: owner,
            title: transaction.title,
            amount: transaction.amount,
            date: transaction.date,
            category: transaction.category,
            created_at: timestamp,
            updated_at: timestamp,
        };
        state.next_transaction_id += 1;
        state.transactions.push(transaction.clone());

        Ok(transaction)
    }

    fn get_transaction(&self, owner: UserID, id: TransactionId) -> Result<Transaction, Error> {
        self.lock()?
            .transactions
            .iter()
            .find(|transaction| transaction.id == id && transaction.user_id == owner)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn list_transactions(&self, owner: UserID) -> Result<Vec<Transaction>, Error> {
        let mut transactions: Vec<Transaction> = self
            .lock()?
            .transactions
            .iter()
            .filter(|transaction| transaction.user_id == owner)
            .cloned()
            .collect();

        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

        Ok(transactions)
    }

    fn update_transaction(
        &self,
        owner: UserID,
        id: TransactionId,
        transaction: ValidatedTransaction,
    ) -> Result<Transaction, Error> {
        let mut state = self.lock()?;

        let existing = state
            .transactions
            .iter_mut()
            .find(|existing| existing.id == id && existing.user_id == owner)
            .ok_or(Error::NotFound)?;

        existing.title = transaction.title;
        existing.amount = transaction.amount;
        existing.date = transaction.date;
        existing.category = transaction.category;
        existing.updated_at = now();

        Ok(existing.clone())
    }

    fn delete_transaction(&self, owner: UserID, id: TransactionId) -> Result<(), Error> {
        let mut state = self.lock()?;

        let index = state
            .transactions
            .iter()
            .position(|transaction| transaction.id == id && transaction.user_id == owner)
            .ok_or(Error::NotFound)?;
        state.transactions.remove(index);

        Ok(())
    }
}
