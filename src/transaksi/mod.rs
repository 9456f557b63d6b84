//! Billing transaction (transaksi) persistence and endpoints.
//!
//! This module contains everything related to billing transactions:
//! - The `Transaksi` header and `NewTransaksi` models.
//! - The three multi-row units of work: create, amend, and delete. Each
//!   writes a header plus its line items atomically; a failed sub-step
//!   rolls the whole operation back.
//! - The canonical read model joining headers, line items, the catalog and
//!   the patient directory, shared by the list view and the projections.
//! - Route handlers for the list/create/amend/delete endpoints.

mod amend_endpoint;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;
mod query;

pub use amend_endpoint::amend_transaksi_endpoint;
pub use core::{
    MAX_NAMA_PASIEN_LENGTH, NewTransaksi, Transaksi, amend_transaksi, count_transaksi,
    create_transaksi,
    create_transaksi_detail_table, create_transaksi_table, delete_transaksi, get_transaksi,
    map_transaksi_row,
};
pub use create_endpoint::create_transaksi_endpoint;
pub use delete_endpoint::delete_transaksi_endpoint;
pub use list_endpoint::list_transaksi_endpoint;
pub use query::{DetailLine, TransaksiRecord, load_record, load_records_between, load_records_page};

#[cfg(test)]
pub use core::get_detail_layanan_ids;
