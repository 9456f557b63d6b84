//! Database schema initialization.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    draft::create_draft_table,
    layanan::create_layanan_table,
    pasien::create_pasien_table,
    transaksi::{create_transaksi_detail_table, create_transaksi_table},
};

/// Create the application tables if they do not exist.
///
/// All tables are created within a single exclusive SQL transaction so that
/// a partially initialized schema is never left behind. Foreign key
/// enforcement is switched on for the connection, which SQLite leaves off
/// by default.
///
/// # Errors
/// Returns an error if any table cannot be created or if there is an SQL
/// error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must be set outside the transaction, SQLite ignores it inside one.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_layanan_table(&transaction)?;
    create_pasien_table(&transaction)?;
    create_transaksi_table(&transaction)?;
    create_transaksi_detail_table(&transaction)?;
    create_draft_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
