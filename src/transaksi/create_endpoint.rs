//! Defines the endpoint for committing a draft as a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    actor::ActorId,
    database_id::LayananId,
    draft::clear_draft,
    pasien::Nik,
    transaksi::{MAX_NAMA_PASIEN_LENGTH, NewTransaksi, create_transaksi},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransaksiState {
    /// The database connection for the billing store.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransaksiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for committing a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransaksiForm {
    /// The patient name as entered at the desk.
    pub nama_pasien: String,
    /// The NIK of the registered patient, if one was bound.
    pub nik_pasien: Option<Nik>,
    /// The selected services, one line item each.
    pub layanan_ids: Vec<LayananId>,
    /// The sum of the selected services' unit prices.
    pub total_harga: f64,
    /// The amount tendered by the payer.
    pub total_bayar: f64,
}

/// A route handler that commits a draft as a new transaction and discards
/// the acting admin's stored draft.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn create_transaksi_endpoint(
    State(state): State<CreateTransaksiState>,
    actor: ActorId,
    Json(form): Json<CreateTransaksiForm>,
) -> Response {
    let new = match validate_form(form, actor) {
        Ok(new) => new,
        Err(error) => return error.into_response(),
    };

    let connection = state.db_connection.lock().unwrap();

    let transaksi = match create_transaksi(new, &connection) {
        Ok(transaksi) => transaksi,
        Err(error) => return error.into_response(),
    };

    // The committed draft is spent. A failure here must not undo the
    // commit, so it is logged and swallowed.
    if let Err(error) = clear_draft(actor.0, &connection) {
        tracing::warn!("Could not discard draft for admin {}: {error}", actor.0);
    }

    (StatusCode::CREATED, Json(transaksi)).into_response()
}

fn validate_form(form: CreateTransaksiForm, actor: ActorId) -> Result<NewTransaksi, Error> {
    let nama_pasien = form.nama_pasien.trim();
    if nama_pasien.is_empty() {
        return Err(Error::EmptyNamaPasien);
    }
    if nama_pasien.chars().count() > MAX_NAMA_PASIEN_LENGTH {
        return Err(Error::NamaPasienTooLong(nama_pasien.chars().count()));
    }

    if form.layanan_ids.is_empty() {
        return Err(Error::EmptyLayanan);
    }

    // A valid submission always covers the bill in full.
    if form.total_bayar < form.total_harga {
        return Err(Error::Underpaid {
            due: form.total_harga,
            bayar: form.total_bayar,
        });
    }

    Ok(NewTransaksi {
        id_admin: actor.0,
        nama_pasien: nama_pasien.to_owned(),
        nik_pasien: form.nik_pasien,
        layanan_ids: form.layanan_ids,
        total_harga: form.total_harga,
        total_bayar: form.total_bayar,
    })
}
