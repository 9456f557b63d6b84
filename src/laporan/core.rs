//! Defines the revenue report (laporan) model and its projections.
//!
//! A report covers a span of calendar dates in the clinic's local timezone.
//! Transactions are stored with UTC timestamps, so the local date bounds
//! are converted to UTC before the range query runs. The daily, weekly, and
//! monthly reports are all the same projection over different spans.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Duration, UtcOffset};

use crate::{
    Error,
    database_id::LayananId,
    money::round_dp2,
    timezone::get_local_offset,
    transaksi::load_records_between,
};

/// One service's aggregate on a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaporanBaris {
    /// The billed service's ID.
    pub id_layanan: LayananId,
    /// The billed service's display name.
    pub nama_layanan: String,
    /// How many times the service was billed in the span.
    pub jumlah: u64,
    /// The service's current unit price.
    pub harga: f64,
    /// `jumlah` times `harga`.
    pub subtotal: f64,
}

/// A revenue report over a span of local calendar dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Laporan {
    /// The first local date covered, inclusive.
    pub tanggal_mulai: Date,
    /// The last local date covered, inclusive.
    pub tanggal_akhir: Date,
    /// One row per billed service, ordered by service ID.
    pub per_layanan: Vec<LaporanBaris>,
    /// The number of transactions in the span.
    pub total_transaksi: u64,
    /// The sum of the per-service subtotals.
    pub total_pendapatan: f64,
}

/// Project the revenue report for the local dates `start` through `end`,
/// both inclusive.
///
/// `timezone` must be a canonical timezone name, e.g. "Asia/Jakarta"; it
/// decides which UTC instants fall on which local date.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidTimezone] if `timezone` is not a known canonical
///   timezone,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn laporan_rentang(
    start: Date,
    end: Date,
    timezone: &str,
    connection: &Connection,
) -> Result<Laporan, Error> {
    let offset = get_local_offset(timezone)
        .ok_or_else(|| Error::InvalidTimezone(timezone.to_owned()))?;

    let start_utc = start
        .midnight()
        .assume_offset(offset)
        .to_offset(UtcOffset::UTC);
    let end_utc = end
        .next_day()
        .unwrap_or(end)
        .midnight()
        .assume_offset(offset)
        .to_offset(UtcOffset::UTC);

    let records = load_records_between(start_utc, end_utc, connection)?;

    let mut per_layanan: BTreeMap<LayananId, LaporanBaris> = BTreeMap::new();

    for record in &records {
        for detail in &record.details {
            let baris = per_layanan
                .entry(detail.id_layanan)
                .or_insert_with(|| LaporanBaris {
                    id_layanan: detail.id_layanan,
                    nama_layanan: detail.nama_layanan.clone(),
                    jumlah: 0,
                    harga: detail.total_harga,
                    subtotal: 0.0,
                });

            baris.jumlah += 1;
            baris.subtotal = round_dp2(baris.jumlah as f64 * baris.harga);
        }
    }

    let per_layanan: Vec<LaporanBaris> = per_layanan.into_values().collect();
    let total_pendapatan = round_dp2(per_layanan.iter().map(|baris| baris.subtotal).sum());

    Ok(Laporan {
        tanggal_mulai: start,
        tanggal_akhir: end,
        per_layanan,
        total_transaksi: records.len() as u64,
        total_pendapatan,
    })
}

/// Project the revenue report for a single local calendar date.
///
/// # Errors
/// See [laporan_rentang].
pub fn laporan_harian(date: Date, timezone: &str, connection: &Connection) -> Result<Laporan, Error> {
    laporan_rentang(date, date, timezone, connection)
}

/// Project the revenue report for the Monday-based week containing `date`.
///
/// # Errors
/// See [laporan_rentang].
pub fn laporan_mingguan(
    date: Date,
    timezone: &str,
    connection: &Connection,
) -> Result<Laporan, Error> {
    let monday =
        date.saturating_sub(Duration::days(date.weekday().number_days_from_monday() as i64));
    let sunday = monday.saturating_add(Duration::days(6));

    laporan_rentang(monday, sunday, timezone, connection)
}

/// Project the revenue report for the calendar month containing `date`.
///
/// # Errors
/// See [laporan_rentang].
pub fn laporan_bulanan(
    date: Date,
    timezone: &str,
    connection: &Connection,
) -> Result<Laporan, Error> {
    // Day one and the month length are always valid days of the month.
    let first = Date::from_calendar_date(date.year(), date.month(), 1).unwrap_or(date);
    let last = Date::from_calendar_date(date.year(), date.month(), date.month().length(date.year()))
        .unwrap_or(date);

    laporan_rentang(first, last, timezone, connection)
}

#[cfg(test)]
mod laporan_tests {
    use rusqlite::Connection;
    use time::{Month, OffsetDateTime, Weekday, macros::date};

    use crate::{
        Error,
        db::initialize,
        layanan::create_layanan,
        timezone::get_local_offset,
        transaksi::{NewTransaksi, create_transaksi},
    };

    use super::{laporan_bulanan, laporan_harian, laporan_mingguan, laporan_rentang};

    const TIMEZONE: &str = "Asia/Jakarta";

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn today_local() -> time::Date {
        OffsetDateTime::now_utc()
            .to_offset(get_local_offset(TIMEZONE).unwrap())
            .date()
    }

    fn bill(conn: &Connection, layanan_ids: Vec<i64>, total: f64) {
        create_transaksi(
            NewTransaksi {
                id_admin: 1,
                nama_pasien: "Budi Santoso".to_owned(),
                nik_pasien: None,
                layanan_ids,
                total_harga: total,
                total_bayar: total,
            },
            conn,
        )
        .unwrap();
    }

    #[test]
    fn daily_report_aggregates_per_service() {
        let conn = get_test_connection();
        let x = create_layanan("Konsultasi Dokter Umum", 50_000.0, &conn).unwrap();
        let y = create_layanan("Pemeriksaan Laboratorium", 30_000.0, &conn).unwrap();
        bill(&conn, vec![x.id_layanan, y.id_layanan], 80_000.0);
        bill(&conn, vec![x.id_layanan], 50_000.0);

        let laporan = laporan_harian(today_local(), TIMEZONE, &conn).unwrap();

        assert_eq!(laporan.total_transaksi, 2);
        assert_eq!(laporan.per_layanan.len(), 2);
        let baris_x = &laporan.per_layanan[0];
        assert_eq!(baris_x.jumlah, 2);
        assert_eq!(baris_x.subtotal, 100_000.0);
        assert_eq!(laporan.total_pendapatan, 130_000.0);
    }

    #[test]
    fn day_without_transactions_yields_empty_report() {
        let conn = get_test_connection();
        let x = create_layanan("Konsultasi Dokter Umum", 50_000.0, &conn).unwrap();
        bill(&conn, vec![x.id_layanan], 50_000.0);

        let laporan = laporan_harian(date!(2000 - 01 - 01), TIMEZONE, &conn).unwrap();

        assert_eq!(laporan.total_transaksi, 0);
        assert!(laporan.per_layanan.is_empty());
        assert_eq!(laporan.total_pendapatan, 0.0);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let conn = get_test_connection();

        let result = laporan_rentang(
            date!(2026 - 08 - 01),
            date!(2026 - 08 - 31),
            "Not/AZone",
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidTimezone("Not/AZone".to_owned())));
    }

    #[test]
    fn weekly_report_spans_monday_through_sunday() {
        let conn = get_test_connection();

        let laporan = laporan_mingguan(date!(2026 - 08 - 26), TIMEZONE, &conn).unwrap();

        assert_eq!(laporan.tanggal_mulai, date!(2026 - 08 - 24));
        assert_eq!(laporan.tanggal_mulai.weekday(), Weekday::Monday);
        assert_eq!(laporan.tanggal_akhir, date!(2026 - 08 - 30));
    }

    #[test]
    fn monthly_report_spans_the_whole_month() {
        let conn = get_test_connection();

        let laporan = laporan_bulanan(date!(2026 - 02 - 14), TIMEZONE, &conn).unwrap();

        assert_eq!(laporan.tanggal_mulai, date!(2026 - 02 - 01));
        assert_eq!(laporan.tanggal_akhir, date!(2026 - 02 - 28));
        assert_eq!(laporan.tanggal_akhir.month(), Month::February);
    }

    #[test]
    fn todays_transactions_fall_within_this_week_and_month() {
        let conn = get_test_connection();
        let x = create_layanan("Konsultasi Dokter Umum", 50_000.0, &conn).unwrap();
        bill(&conn, vec![x.id_layanan], 50_000.0);

        let mingguan = laporan_mingguan(today_local(), TIMEZONE, &conn).unwrap();
        let bulanan = laporan_bulanan(today_local(), TIMEZONE, &conn).unwrap();

        assert_eq!(mingguan.total_transaksi, 1);
        assert_eq!(bulanan.total_transaksi, 1);
    }
}
