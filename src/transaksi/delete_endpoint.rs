//! Defines the endpoint for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, database_id::TransaksiId, transaksi::delete_transaksi};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransaksiState {
    /// The database connection for the billing store.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransaksiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that deletes a transaction and all of its line items.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn delete_transaksi_endpoint(
    State(state): State<DeleteTransaksiState>,
    Path(id_transaksi): Path<TransaksiId>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match delete_transaksi(id_transaksi, &connection) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}
