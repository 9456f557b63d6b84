//! Receipt (struk) and revenue report (laporan) projections.
//!
//! Both are pure read models projected from stored transactions. Service
//! names and prices are resolved from the current catalog on every read,
//! so regenerating a receipt or report always reflects the catalog as it
//! is now.

mod core;
mod laporan_endpoint;
mod struk;
mod struk_endpoint;

pub use core::{
    Laporan, LaporanBaris, laporan_bulanan, laporan_harian, laporan_mingguan, laporan_rentang,
};
pub use laporan_endpoint::{
    laporan_bulanan_endpoint, laporan_harian_endpoint, laporan_mingguan_endpoint,
};
pub use struk::{Struk, StrukLine, struk};
pub use struk_endpoint::get_struk_endpoint;
