//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a billable service (layanan) in the catalog.
pub type LayananId = DatabaseId;
/// The ID of a billing transaction header.
pub type TransaksiId = DatabaseId;
/// The ID of a transaction line item.
pub type TransaksiDetailId = DatabaseId;
/// The opaque ID of the authenticated admin acting on a request.
pub type AdminId = DatabaseId;
