//! The canonical read model for stored transactions.
//!
//! The list view, the receipt, and the reports all read the same shape: a
//! header joined to its line items with service names and prices resolved
//! from the current catalog, and the patient name resolved from the patient
//! record when the reference is still live. Each consumer projects from
//! this one model instead of running its own ad hoc query.
//!
//! Prices are deliberately not snapshotted onto line items, so every load
//! reflects the catalog as it is now.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    database_id::{LayananId, TransaksiId},
    transaksi::{Transaksi, map_transaksi_row},
};
use time::OffsetDateTime;

/// One line item with its service resolved from the current catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailLine {
    /// The billed service's ID.
    pub id_layanan: LayananId,
    /// The billed service's display name.
    pub nama_layanan: String,
    /// The service's current unit price.
    pub total_harga: f64,
}

/// A stored transaction with every reference resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransaksiRecord {
    /// The transaction header.
    #[serde(flatten)]
    pub transaksi: Transaksi,
    /// The patient name to display: the registered patient's name while the
    /// reference is live, the denormalized header name otherwise.
    pub nama_tampil: String,
    /// The line items, in insertion order.
    pub details: Vec<DetailLine>,
}

/// Load the canonical record for a single transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id_transaksi` does not refer to a stored
///   transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn load_record(
    id_transaksi: TransaksiId,
    connection: &Connection,
) -> Result<TransaksiRecord, Error> {
    let record = connection
        .prepare(&select_headers("WHERE transaksi.id_transaksi = ?1", ""))?
        .query_one([id_transaksi], map_header_row)?;

    attach_details(record, connection)
}

/// Load the canonical records for every transaction created within
/// `[start, end)`, newest first.
///
/// Both bounds must be in UTC, matching how creation timestamps are stored.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn load_records_between(
    start: OffsetDateTime,
    end: OffsetDateTime,
    connection: &Connection,
) -> Result<Vec<TransaksiRecord>, Error> {
    let records = connection
        .prepare(&select_headers(
            "WHERE transaksi.created_at >= ?1 AND transaksi.created_at < ?2",
            "",
        ))?
        .query_map((start, end), map_header_row)?
        .collect::<Result<Vec<_>, _>>()?;

    records
        .into_iter()
        .map(|record| attach_details(record, connection))
        .collect()
}

/// Load one page of canonical records, newest first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn load_records_page(
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<TransaksiRecord>, Error> {
    // SQLite binds integers as i64.
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(offset).unwrap_or(i64::MAX);

    let records = connection
        .prepare(&select_headers("", "LIMIT ?1 OFFSET ?2"))?
        .query_map((limit, offset), map_header_row)?
        .collect::<Result<Vec<_>, _>>()?;

    records
        .into_iter()
        .map(|record| attach_details(record, connection))
        .collect()
}

fn select_headers(where_clause: &str, limit_clause: &str) -> String {
    format!(
        "SELECT transaksi.id_transaksi, transaksi.id_admin, transaksi.nama_pasien,
                transaksi.nik_pasien, transaksi.total_harga, transaksi.total_bayar,
                transaksi.created_at,
                COALESCE(pasien.nama, transaksi.nama_pasien) AS nama_tampil
         FROM transaksi
         LEFT JOIN pasien ON pasien.nik = transaksi.nik_pasien
         {where_clause}
         ORDER BY transaksi.created_at DESC, transaksi.id_transaksi DESC
         {limit_clause}"
    )
}

fn map_header_row(row: &rusqlite::Row) -> Result<TransaksiRecord, rusqlite::Error> {
    Ok(TransaksiRecord {
        transaksi: map_transaksi_row(row)?,
        nama_tampil: row.get(7)?,
        details: Vec::new(),
    })
}

fn attach_details(
    mut record: TransaksiRecord,
    connection: &Connection,
) -> Result<TransaksiRecord, Error> {
    record.details = connection
        .prepare(
            "SELECT layanan.id_layanan, layanan.nama_layanan, layanan.total_harga
             FROM transaksi_detail
             JOIN layanan ON layanan.id_layanan = transaksi_detail.id_layanan
             WHERE transaksi_detail.id_transaksi = :id
             ORDER BY transaksi_detail.id_transaksi_detail",
        )?
        .query_map(
            &[(":id", &record.transaksi.id_transaksi)],
            |row| {
                Ok(DetailLine {
                    id_layanan: row.get(0)?,
                    nama_layanan: row.get(1)?,
                    total_harga: row.get(2)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(record)
}
