//! Database setup and the shared connection lock.

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, customer::create_customer_table, ledger::create_ledger_table,
    product::create_product_table, user::create_user_table,
};

/// Create the application tables if they do not exist yet.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_customer_table(&transaction)?;
    create_product_table(&transaction)?;
    create_ledger_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Lock the shared database connection.
///
/// # Errors
///
/// Returns [Error::DatabaseLockError] if another thread panicked while holding the lock.
pub fn lock_connection(
    connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
