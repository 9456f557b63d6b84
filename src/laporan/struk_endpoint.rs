//! Defines the endpoint for reprinting a transaction's receipt.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, database_id::TransaksiId, laporan::struk};

/// The state needed to project a receipt.
#[derive(Debug, Clone)]
pub struct StrukState {
    /// The database connection for the billing store.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StrukState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the receipt for a stored transaction.
/// Receipts can be reprinted any number of times.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_struk_endpoint(
    State(state): State<StrukState>,
    Path(id_transaksi): Path<TransaksiId>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match struk(id_transaksi, &connection) {
        Ok(struk) => Json(struk).into_response(),
        Err(error) => error.into_response(),
    }
}
