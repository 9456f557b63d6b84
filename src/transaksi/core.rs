//! Defines the transaction header model and the three multi-row units of
//! work: create, amend, and delete.
//!
//! These are the only operations in the system that write more than one row
//! at a time, so each runs inside a single SQL transaction. If any sub-step
//! fails the whole operation is rolled back and the store is left exactly
//! as it was before the call.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{AdminId, LayananId, TransaksiId},
    money::round_dp2,
    pasien::Nik,
};

// ============================================================================
// MODELS
// ============================================================================

/// The longest patient name the transaksi table accepts, matching the CHECK
/// constraint on the column.
pub const MAX_NAMA_PASIEN_LENGTH: usize = 50;

/// A billing transaction header: one or more services rendered to a named
/// patient.
///
/// The patient name is denormalized onto the header so the record stays
/// meaningful even after the optional patient reference is cleared by a
/// patient deletion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaksi {
    /// The server-assigned ID of the transaction.
    pub id_transaksi: TransaksiId,
    /// The admin who recorded the transaction.
    pub id_admin: AdminId,
    /// The patient name as entered at the desk.
    pub nama_pasien: String,
    /// The NIK of the registered patient, if one was bound.
    pub nik_pasien: Option<Nik>,
    /// The sum of the line items' unit prices at the time of last write.
    pub total_harga: f64,
    /// The total paid to date. Monotonically non-decreasing across
    /// amendments.
    pub total_bayar: f64,
    /// When the transaction was first recorded.
    pub created_at: OffsetDateTime,
}

/// The input for creating a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaksi {
    /// The admin recording the transaction, passed explicitly from the
    /// request boundary.
    pub id_admin: AdminId,
    /// The patient name as entered at the desk.
    pub nama_pasien: String,
    /// The NIK of the registered patient, if one was bound.
    pub nik_pasien: Option<Nik>,
    /// The selected services, one line item each. Must be non-empty.
    pub layanan_ids: Vec<LayananId>,
    /// The sum of the selected services' unit prices.
    pub total_harga: f64,
    /// The amount tendered by the payer.
    pub total_bayar: f64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction: one header row plus one line item per selected
/// service, as a single all-or-nothing unit of work.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyLayanan] if no services were selected,
/// - or [Error::InvalidForeignKey] if a service or patient reference does
///   not exist (nothing is persisted),
/// - or [Error::DetailNotSaved] if the write would leave the header with
///   zero line items (nothing is persisted),
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaksi(new: NewTransaksi, connection: &Connection) -> Result<Transaksi, Error> {
    if new.layanan_ids.is_empty() {
        return Err(Error::EmptyLayanan);
    }

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;
    let now = OffsetDateTime::now_utc();

    let transaksi = transaction
        .prepare(
            "INSERT INTO transaksi
                (id_admin, nama_pasien, nik_pasien, total_harga, total_bayar, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING id_transaksi, id_admin, nama_pasien, nik_pasien, total_harga, total_bayar,
                       created_at",
        )?
        .query_one(
            (
                new.id_admin,
                &new.nama_pasien,
                &new.nik_pasien,
                round_dp2(new.total_harga),
                round_dp2(new.total_bayar),
                now,
            ),
            map_transaksi_row,
        )?;

    let details_saved = insert_details(transaksi.id_transaksi, &new.layanan_ids, now, &transaction)?;

    if details_saved == 0 {
        // Dropping the transaction rolls everything back.
        return Err(Error::DetailNotSaved);
    }

    transaction.commit()?;

    tracing::info!(
        "Recorded transaction {} for {:?}: total {} paid {}",
        transaksi.id_transaksi,
        transaksi.nama_pasien,
        transaksi.total_harga,
        transaksi.total_bayar,
    );

    Ok(transaksi)
}

/// Amend an existing transaction: overwrite the header totals, then replace
/// every line item with the new selection, as a single all-or-nothing unit
/// of work.
///
/// Line items have no identity across an amendment: all existing rows are
/// deleted and the amended selection is inserted from scratch.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyLayanan] if the amended selection is empty,
/// - or [Error::NotFound] if `id_transaksi` does not refer to a stored
///   transaction,
/// - or [Error::PaymentRegression] if `total_bayar` is lower than the
///   amount already recorded,
/// - or [Error::InvalidForeignKey] if a service reference does not exist,
/// - or [Error::DetailNotSaved] if the write would leave the header with
///   zero line items.
/// On any error the stored transaction is left untouched.
pub fn amend_transaksi(
    id_transaksi: TransaksiId,
    layanan_ids: &[LayananId],
    total_harga: f64,
    total_bayar: f64,
    connection: &Connection,
) -> Result<Transaksi, Error> {
    if layanan_ids.is_empty() {
        return Err(Error::EmptyLayanan);
    }

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;
    let now = OffsetDateTime::now_utc();

    let existing = get_transaksi(id_transaksi, &transaction)?;

    let total_bayar = round_dp2(total_bayar);
    if total_bayar < existing.total_bayar {
        return Err(Error::PaymentRegression {
            recorded: existing.total_bayar,
            proposed: total_bayar,
        });
    }

    transaction.execute(
        "UPDATE transaksi SET total_harga = ?1, total_bayar = ?2, updated_at = ?3
         WHERE id_transaksi = ?4",
        (round_dp2(total_harga), total_bayar, now, id_transaksi),
    )?;

    transaction.execute(
        "DELETE FROM transaksi_detail WHERE id_transaksi = ?1",
        [id_transaksi],
    )?;

    let details_saved = insert_details(id_transaksi, layanan_ids, now, &transaction)?;

    if details_saved == 0 {
        return Err(Error::DetailNotSaved);
    }

    let amended = get_transaksi(id_transaksi, &transaction)?;

    transaction.commit()?;

    tracing::info!(
        "Amended transaction {}: total {} paid {}",
        amended.id_transaksi,
        amended.total_harga,
        amended.total_bayar,
    );

    Ok(amended)
}

/// Delete a transaction and all of its line items as a single
/// all-or-nothing unit of work.
///
/// Line items are removed first since they are foreign-key dependents of
/// the header.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id_transaksi` does not refer to a stored
///   transaction (nothing is mutated),
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaksi(id_transaksi: TransaksiId, connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute(
        "DELETE FROM transaksi_detail WHERE id_transaksi = ?1",
        [id_transaksi],
    )?;

    let headers_deleted = transaction.execute(
        "DELETE FROM transaksi WHERE id_transaksi = ?1",
        [id_transaksi],
    )?;

    if headers_deleted == 0 {
        return Err(Error::NotFound);
    }

    transaction.commit()?;

    tracing::info!("Deleted transaction {id_transaksi}");

    Ok(())
}

/// Retrieve a transaction header from the database by its ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id_transaksi` does not refer to a stored
///   transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaksi(
    id_transaksi: TransaksiId,
    connection: &Connection,
) -> Result<Transaksi, Error> {
    let transaksi = connection
        .prepare(
            "SELECT id_transaksi, id_admin, nama_pasien, nik_pasien, total_harga, total_bayar,
                    created_at
             FROM transaksi WHERE id_transaksi = :id",
        )?
        .query_one(&[(":id", &id_transaksi)], map_transaksi_row)?;

    Ok(transaksi)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL
/// error.
pub fn count_transaksi(connection: &Connection) -> Result<u64, Error> {
    // SQLite reports COUNT as i64, which is never negative here.
    let count: i64 =
        connection.query_row("SELECT COUNT(id_transaksi) FROM transaksi", [], |row| {
            row.get(0)
        })?;

    Ok(u64::try_from(count).unwrap_or_default())
}

/// The line-item service IDs currently stored for a transaction, in
/// insertion order.
#[cfg(test)]
pub fn get_detail_layanan_ids(
    id_transaksi: TransaksiId,
    connection: &Connection,
) -> Result<Vec<LayananId>, Error> {
    connection
        .prepare(
            "SELECT id_layanan FROM transaksi_detail WHERE id_transaksi = :id
             ORDER BY id_transaksi_detail",
        )?
        .query_map(&[(":id", &id_transaksi)], |row| row.get(0))?
        .map(|maybe_id| maybe_id.map_err(Error::from))
        .collect()
}

fn insert_details(
    id_transaksi: TransaksiId,
    layanan_ids: &[LayananId],
    now: OffsetDateTime,
    transaction: &SqlTransaction,
) -> Result<usize, Error> {
    let mut statement = transaction.prepare(
        "INSERT INTO transaksi_detail (id_transaksi, id_layanan, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)",
    )?;

    let mut details_saved = 0;
    for id_layanan in layanan_ids {
        statement.execute((id_transaksi, id_layanan, now))?;
        details_saved += 1;
    }

    Ok(details_saved)
}

/// Create the transaksi table in the database.
///
/// The patient reference is cleared, not cascaded, when a patient record is
/// deleted.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_transaksi_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaksi (
                id_transaksi INTEGER PRIMARY KEY AUTOINCREMENT,
                id_admin INTEGER NOT NULL,
                nama_pasien TEXT NOT NULL CHECK (length(nama_pasien) <= 50),
                nik_pasien TEXT,
                total_harga REAL NOT NULL,
                total_bayar REAL NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(nik_pasien) REFERENCES pasien(nik) ON DELETE SET NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaksi_created_at ON transaksi(created_at)",
        (),
    )?;

    Ok(())
}

/// Create the transaksi_detail table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_transaksi_detail_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaksi_detail (
                id_transaksi_detail INTEGER PRIMARY KEY AUTOINCREMENT,
                id_transaksi INTEGER NOT NULL,
                id_layanan INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(id_transaksi) REFERENCES transaksi(id_transaksi),
                FOREIGN KEY(id_layanan) REFERENCES layanan(id_layanan)
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaksi_detail_transaksi
         ON transaksi_detail(id_transaksi)",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Transaksi].
pub fn map_transaksi_row(row: &Row) -> Result<Transaksi, rusqlite::Error> {
    Ok(Transaksi {
        id_transaksi: row.get(0)?,
        id_admin: row.get(1)?,
        nama_pasien: row.get(2)?,
        nik_pasien: row.get(3)?,
        total_harga: row.get(4)?,
        total_bayar: row.get(5)?,
        created_at: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
