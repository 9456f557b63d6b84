//! Defines the core data model and database queries for the service catalog.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::LayananId, money::round_dp2};

// ============================================================================
// MODELS
// ============================================================================

/// A billable clinical service with a fixed catalog price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layanan {
    /// The ID of the service.
    pub id_layanan: LayananId,
    /// The display name of the service.
    pub nama_layanan: String,
    /// The unit price of the service. Never negative.
    pub total_harga: f64,
}

/// A service annotated with how often it appears on historical line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayananPopularity {
    /// The service.
    #[serde(flatten)]
    pub layanan: Layanan,
    /// The number of line items ever billed against this service.
    pub transaction_count: i64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Add a service to the catalog.
///
/// The unit price is rounded to two fractional digits on write. This exists
/// for the catalog-management collaborator and for seeding test fixtures;
/// the billing workflow never writes to the catalog.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_layanan(
    nama_layanan: &str,
    total_harga: f64,
    connection: &Connection,
) -> Result<Layanan, Error> {
    let now = OffsetDateTime::now_utc();

    let layanan = connection
        .prepare(
            "INSERT INTO layanan (nama_layanan, total_harga, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             RETURNING id_layanan, nama_layanan, total_harga",
        )?
        .query_one(
            (nama_layanan, round_dp2(total_harga), now),
            map_layanan_row,
        )?;

    Ok(layanan)
}

/// Search the catalog with a case-insensitive substring match against the
/// service name or ID.
///
/// The result set is uncapped: the catalog of a single clinic is expected to
/// stay small. An empty query matches every service.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn search_layanan(query: &str, connection: &Connection) -> Result<Vec<Layanan>, Error> {
    let pattern = format!("%{}%", query.trim());

    connection
        .prepare(
            "SELECT id_layanan, nama_layanan, total_harga FROM layanan
             WHERE nama_layanan LIKE :pattern OR CAST(id_layanan AS TEXT) LIKE :pattern
             ORDER BY id_layanan",
        )?
        .query_map(&[(":pattern", &pattern)], map_layanan_row)?
        .map(|maybe_layanan| maybe_layanan.map_err(Error::from))
        .collect()
}

/// The popular-services ranking shown when the transaction screen has no
/// search query.
///
/// Services are ordered by descending historical line-item count with ties
/// broken by catalog order, so a catalog without any billing history
/// degrades to the first `limit` entries with counts of zero.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn popular_layanan(
    limit: u32,
    connection: &Connection,
) -> Result<Vec<LayananPopularity>, Error> {
    connection
        .prepare(
            "SELECT layanan.id_layanan, layanan.nama_layanan, layanan.total_harga,
                    COUNT(transaksi_detail.id_transaksi_detail) AS transaction_count
             FROM layanan
             LEFT JOIN transaksi_detail ON transaksi_detail.id_layanan = layanan.id_layanan
             GROUP BY layanan.id_layanan
             ORDER BY transaction_count DESC, layanan.id_layanan
             LIMIT :limit",
        )?
        .query_map(&[(":limit", &limit)], |row| {
            Ok(LayananPopularity {
                layanan: map_layanan_row(row)?,
                transaction_count: row.get(3)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// Create the layanan table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_layanan_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS layanan (
                id_layanan INTEGER PRIMARY KEY AUTOINCREMENT,
                nama_layanan TEXT NOT NULL,
                total_harga REAL NOT NULL CHECK (total_harga >= 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Layanan].
pub fn map_layanan_row(row: &Row) -> Result<Layanan, rusqlite::Error> {
    Ok(Layanan {
        id_layanan: row.get(0)?,
        nama_layanan: row.get(1)?,
        total_harga: row.get(2)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        layanan::{create_layanan, popular_layanan, search_layanan},
        transaksi::{NewTransaksi, create_transaksi},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_rounds_price_to_two_fractional_digits() {
        let conn = get_test_connection();

        let layanan = create_layanan("Konsultasi Dokter Umum", 50_000.009, &conn).unwrap();

        assert_eq!(layanan.total_harga, 50_000.01);
    }

    #[test]
    fn create_rejects_negative_price() {
        let conn = get_test_connection();

        let result = create_layanan("Konsultasi", -1.0, &conn);

        assert!(result.is_err());
    }

    #[test]
    fn search_matches_name_substring() {
        let conn = get_test_connection();
        create_layanan("Konsultasi Dokter Umum", 50_000.0, &conn).unwrap();
        create_layanan("Pemeriksaan Laboratorium", 75_000.0, &conn).unwrap();

        let results = search_layanan("dokter", &conn).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].nama_layanan, "Konsultasi Dokter Umum");
    }

    #[test]
    fn search_matches_id() {
        let conn = get_test_connection();
        let layanan = create_layanan("Konsultasi Dokter Umum", 50_000.0, &conn).unwrap();

        let results = search_layanan(&layanan.id_layanan.to_string(), &conn).unwrap();

        assert_eq!(results, vec![layanan]);
    }

    #[test]
    fn search_with_empty_query_returns_whole_catalog() {
        let conn = get_test_connection();
        create_layanan("Konsultasi Dokter Umum", 50_000.0, &conn).unwrap();
        create_layanan("Pemeriksaan Laboratorium", 75_000.0, &conn).unwrap();

        let results = search_layanan("", &conn).unwrap();

        assert_eq!(results.len(), 2);
    }

    #[test]
    fn popular_ranking_without_history_uses_catalog_order() {
        let conn = get_test_connection();
        create_layanan("Konsultasi Dokter Umum", 50_000.0, &conn).unwrap();
        create_layanan("Pemeriksaan Laboratorium", 75_000.0, &conn).unwrap();

        let ranking = popular_layanan(10, &conn).unwrap();

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].layanan.nama_layanan, "Konsultasi Dokter Umum");
        assert_eq!(ranking[0].transaction_count, 0);
        assert_eq!(ranking[1].transaction_count, 0);
    }

    #[test]
    fn popular_ranking_orders_by_usage() {
        let conn = get_test_connection();
        let sering = create_layanan("Konsultasi Dokter Umum", 50_000.0, &conn).unwrap();
        let jarang = create_layanan("Pemeriksaan Laboratorium", 75_000.0, &conn).unwrap();
        // Five line items against the first service, two against the second.
        for _ in 0..5 {
            bill_service(sering.id_layanan, sering.total_harga, &conn);
        }
        for _ in 0..2 {
            bill_service(jarang.id_layanan, jarang.total_harga, &conn);
        }

        let ranking = popular_layanan(10, &conn).unwrap();

        assert_eq!(ranking[0].layanan.id_layanan, sering.id_layanan);
        assert_eq!(ranking[0].transaction_count, 5);
        assert_eq!(ranking[1].layanan.id_layanan, jarang.id_layanan);
        assert_eq!(ranking[1].transaction_count, 2);
    }

    fn bill_service(id_layanan: i64, harga: f64, conn: &Connection) {
        create_transaksi(
            NewTransaksi {
                id_admin: 1,
                nama_pasien: "Budi".to_owned(),
                nik_pasien: None,
                layanan_ids: vec![id_layanan],
                total_harga: harga,
                total_bayar: harga,
            },
            conn,
        )
        .expect("Could not create transaction");
    }

    #[test]
    fn popular_ranking_caps_result_size() {
        let conn = get_test_connection();
        for i in 0..15 {
            create_layanan(&format!("Layanan {i}"), 10_000.0, &conn).unwrap();
        }

        let ranking = popular_layanan(10, &conn).unwrap();

        assert_eq!(ranking.len(), 10);
    }
}
