/*! This module defines the initialization of the application's database. */

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, record::create_records_table};

/// Add the application tables to the database.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_records_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
