//! Registered patient (pasien) lookup and registration.
//!
//! Patient management screens are owned by an external collaborator. The
//! billing workflow reads the directory to bind a registered patient to a
//! transaction, and exposes the quick-registration operation used from the
//! transaction screen for patients who are not yet on file.

mod core;
mod register_endpoint;
mod search_endpoint;

pub use core::{Nik, Pasien, create_pasien, create_pasien_table, search_pasien};
pub use register_endpoint::register_pasien_endpoint;
pub use search_endpoint::search_pasien_endpoint;

#[cfg(test)]
pub use core::get_pasien;
