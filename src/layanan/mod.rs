//! The billable service (layanan) catalog lookup.
//!
//! Catalog management itself is owned by an external collaborator; the
//! billing workflow only reads the catalog:
//! - Substring search by name or ID for the transaction screen.
//! - A popularity ranking by historical line-item count for the empty query.

mod core;
mod search_endpoint;

pub use core::{
    Layanan, LayananPopularity, create_layanan, create_layanan_table, popular_layanan,
    search_layanan,
};
pub use search_endpoint::search_layanan_endpoint;
