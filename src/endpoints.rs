//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transaksi/{id_transaksi}',
//! use [format_endpoint].

/// The route to search the service catalog, or fetch the popular services
/// ranking when the query is empty.
pub const LAYANAN_SEARCH: &str = "/api/layanan";
/// The route to search registered patients by NIK or name.
pub const PASIEN_SEARCH: &str = "/api/pasien";
/// The route to register a new patient from the transaction screen.
pub const PASIEN_REGISTER: &str = "/api/pasien";
/// The route to load, mirror, or discard the actor's billing draft.
pub const DRAFT: &str = "/api/draft";
/// The route to list transactions or create a new one.
pub const TRANSAKSI: &str = "/api/transaksi";
/// The route to amend or delete a single transaction.
pub const TRANSAKSI_ITEM: &str = "/api/transaksi/{id_transaksi}";
/// The route to fetch the printable receipt of a transaction.
pub const STRUK: &str = "/api/transaksi/{id_transaksi}/struk";
/// The route for the daily report.
pub const LAPORAN_HARIAN: &str = "/api/laporan/harian";
/// The route for the weekly report.
pub const LAPORAN_MINGGUAN: &str = "/api/laporan/mingguan";
/// The route for the monthly report.
pub const LAPORAN_BULANAN: &str = "/api/laporan/bulanan";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace. If no
/// parameter is found in `endpoint_path`, the function returns the original
/// `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
