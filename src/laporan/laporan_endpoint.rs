//! Defines the endpoints for the daily, weekly, and monthly revenue
//! reports.
//!
//! All three take an optional `tanggal` query parameter naming a local
//! calendar date; when omitted, the report covers the span containing
//! today in the clinic's timezone.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    laporan::{Laporan, laporan_bulanan, laporan_harian, laporan_mingguan},
    timezone::get_local_offset,
};

/// The state needed to project a revenue report.
#[derive(Debug, Clone)]
pub struct LaporanState {
    /// The database connection for the billing store.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The clinic's local timezone as a canonical timezone name.
    pub local_timezone: String,
}

impl FromRef<AppState> for LaporanState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters for the report endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LaporanQuery {
    /// The local calendar date the report should cover, e.g. "2026-08-30".
    /// Defaults to today in the clinic's timezone.
    pub tanggal: Option<Date>,
}

/// A route handler that returns the revenue report for one local calendar
/// date.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn laporan_harian_endpoint(
    State(state): State<LaporanState>,
    Query(query): Query<LaporanQuery>,
) -> Response {
    project(&state, query, laporan_harian)
}

/// A route handler that returns the revenue report for the Monday-based
/// week containing the requested date.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn laporan_mingguan_endpoint(
    State(state): State<LaporanState>,
    Query(query): Query<LaporanQuery>,
) -> Response {
    project(&state, query, laporan_mingguan)
}

/// A route handler that returns the revenue report for the calendar month
/// containing the requested date.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn laporan_bulanan_endpoint(
    State(state): State<LaporanState>,
    Query(query): Query<LaporanQuery>,
) -> Response {
    project(&state, query, laporan_bulanan)
}

fn project(
    state: &LaporanState,
    query: LaporanQuery,
    projection: fn(Date, &str, &Connection) -> Result<Laporan, Error>,
) -> Response {
    let tanggal = match query.tanggal {
        Some(tanggal) => tanggal,
        None => match get_local_offset(&state.local_timezone) {
            Some(offset) => OffsetDateTime::now_utc().to_offset(offset).date(),
            None => {
                return Error::InvalidTimezone(state.local_timezone.clone()).into_response();
            }
        },
    };

    let connection = state.db_connection.lock().unwrap();

    match projection(tanggal, &state.local_timezone, &connection) {
        Ok(laporan) => Json(laporan).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod laporan_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        body::to_bytes,
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        layanan::create_layanan,
        transaksi::{NewTransaksi, create_transaksi},
    };

    use super::{
        LaporanQuery, LaporanState, laporan_harian_endpoint, laporan_mingguan_endpoint,
    };

    fn get_test_state() -> LaporanState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let x = create_layanan("Konsultasi Dokter Umum", 50_000.0, &conn).unwrap();
        create_transaksi(
            NewTransaksi {
                id_admin: 1,
                nama_pasien: "Budi Santoso".to_owned(),
                nik_pasien: None,
                layanan_ids: vec![x.id_layanan],
                total_harga: 50_000.0,
                total_bayar: 50_000.0,
            },
            &conn,
        )
        .unwrap();

        LaporanState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Asia/Jakarta".to_owned(),
        }
    }

    #[tokio::test]
    async fn defaults_to_today() {
        let state = get_test_state();

        let response = laporan_harian_endpoint(State(state), Query(LaporanQuery::default())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let laporan: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(laporan["total_transaksi"], 1);
        assert_eq!(laporan["total_pendapatan"], 50_000.0);
    }

    #[tokio::test]
    async fn reports_requested_date() {
        let state = get_test_state();
        let query = LaporanQuery {
            tanggal: Some(date!(2000 - 01 - 01)),
        };

        let response = laporan_harian_endpoint(State(state), Query(query)).await;

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let laporan: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(laporan["total_transaksi"], 0);
    }

    #[tokio::test]
    async fn weekly_report_covers_the_requested_week() {
        let state = get_test_state();
        let query = LaporanQuery {
            tanggal: Some(date!(2026 - 08 - 26)),
        };

        let response = laporan_mingguan_endpoint(State(state), Query(query)).await;

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let laporan: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(laporan["tanggal_mulai"], "2026-08-24");
        assert_eq!(laporan["tanggal_akhir"], "2026-08-30");
    }
}
