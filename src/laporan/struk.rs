//! The receipt (struk) projection for a single stored transaction.

use rusqlite::Connection;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error, database_id::TransaksiId, money::round_dp2, transaksi::load_record,
};

/// One line on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrukLine {
    /// The billed service's display name.
    pub nama_layanan: String,
    /// The service's current unit price.
    pub total_harga: f64,
}

/// A printable receipt for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Struk {
    /// The receipt's transaction ID.
    pub id_transaksi: TransaksiId,
    /// The patient name to print: the registered patient's name while the
    /// reference is live, the name entered at the desk otherwise.
    pub nama_pasien: String,
    /// One line per billed service.
    pub lines: Vec<StrukLine>,
    /// The stored bill total.
    pub total_harga: f64,
    /// The stored total paid to date.
    pub total_bayar: f64,
    /// Change due: paid minus billed. Negative when an amendment left a
    /// balance outstanding, and printed as-is.
    pub kembalian: f64,
    /// When the transaction was first recorded.
    pub created_at: OffsetDateTime,
}

/// Project the receipt for a stored transaction.
///
/// Projecting the same transaction twice yields the same receipt; nothing
/// is written.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id_transaksi` does not refer to a stored
///   transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn struk(id_transaksi: TransaksiId, connection: &Connection) -> Result<Struk, Error> {
    let record = load_record(id_transaksi, connection)?;

    Ok(Struk {
        id_transaksi: record.transaksi.id_transaksi,
        nama_pasien: record.nama_tampil,
        lines: record
            .details
            .into_iter()
            .map(|detail| StrukLine {
                nama_layanan: detail.nama_layanan,
                total_harga: detail.total_harga,
            })
            .collect(),
        total_harga: record.transaksi.total_harga,
        total_bayar: record.transaksi.total_bayar,
        kembalian: round_dp2(record.transaksi.total_bayar - record.transaksi.total_harga),
        created_at: record.transaksi.created_at,
    })
}
