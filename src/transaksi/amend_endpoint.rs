//! Defines the endpoint for amending an existing transaction.
//!
//! An amendment replaces the service selection and settles any newly owed
//! balance. The patient identity on the header is fixed at creation time
//! and cannot be changed here.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    actor::ActorId,
    database_id::{LayananId, TransaksiId},
    draft::clear_draft,
    transaksi::amend_transaksi,
};

/// The state needed to amend a transaction.
#[derive(Debug, Clone)]
pub struct AmendTransaksiState {
    /// The database connection for the billing store.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AmendTransaksiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for amending a transaction.
#[derive(Debug, Deserialize)]
pub struct AmendTransaksiForm {
    /// The amended service selection, replacing the stored line items.
    pub layanan_ids: Vec<LayananId>,
    /// The sum of the amended selection's unit prices.
    pub total_harga: f64,
    /// The total paid to date after this amendment: the previously recorded
    /// amount plus whatever was tendered now.
    pub total_bayar: f64,
}

/// A route handler that amends a stored transaction and discards the
/// acting admin's stored draft.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn amend_transaksi_endpoint(
    State(state): State<AmendTransaksiState>,
    actor: ActorId,
    Path(id_transaksi): Path<TransaksiId>,
    Json(form): Json<AmendTransaksiForm>,
) -> Response {
    if form.layanan_ids.is_empty() {
        return Error::EmptyLayanan.into_response();
    }

    // A valid submission always covers the bill in full.
    if form.total_bayar < form.total_harga {
        return Error::Underpaid {
            due: form.total_harga,
            bayar: form.total_bayar,
        }
        .into_response();
    }

    let connection = state.db_connection.lock().unwrap();

    let amended = match amend_transaksi(
        id_transaksi,
        &form.layanan_ids,
        form.total_harga,
        form.total_bayar,
        &connection,
    ) {
        Ok(amended) => amended,
        Err(error) => return error.into_response(),
    };

    if let Err(error) = clear_draft(actor.0, &connection) {
        tracing::warn!("Could not discard draft for admin {}: {error}", actor.0);
    }

    Json(amended).into_response()
}
