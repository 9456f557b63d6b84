//! E-Register Rajal is a web service for clinic outpatient registration and
//! billing: catalog lookup for services (layanan) and patients (pasien),
//! an in-progress billing draft with settlement arithmetic, atomic
//! transaction persistence, and receipt/report projections.
//!
//! This library provides a JSON REST API over a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod actor;
mod app_state;
mod database_id;
mod db;
mod draft;
mod endpoints;
mod laporan;
mod layanan;
mod logging;
mod money;
mod pagination;
mod pasien;
mod routing;
mod timezone;
mod transaksi;

pub use actor::ActorId;
pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use draft::{
    Amendment, Draft, DraftLayanan, DraftSession, DraftStore, MemoryDraftStore, Settlement,
    SqliteDraftStore,
};
pub use laporan::{Laporan, LaporanBaris, Struk, StrukLine, laporan_rentang, struk};
pub use layanan::{Layanan, LayananPopularity, popular_layanan, search_layanan};
pub use logging::logging_middleware;
pub use pagination::PaginationConfig;
pub use pasien::{Nik, Pasien, search_pasien};
pub use routing::build_router;
pub use transaksi::{DetailLine, Transaksi, TransaksiRecord, load_record};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A billing draft was submitted without a patient name.
    #[error("patient name must not be empty")]
    EmptyNamaPasien,

    /// The patient name on a billing draft exceeds the 50 character column
    /// limit inherited from the registration desk forms.
    #[error("patient name must be at most 50 characters, got {0}")]
    NamaPasienTooLong(usize),

    /// A billing draft was submitted with no services selected.
    #[error("at least one layanan must be selected")]
    EmptyLayanan,

    /// The tendered amount does not cover the amount currently due.
    #[error("tendered amount {bayar} does not cover the amount due {due}")]
    Underpaid {
        /// The amount currently due: the draft total for a new transaction,
        /// or the remaining balance when amending an existing one.
        due: f64,
        /// The amount tendered by the payer.
        bayar: f64,
    },

    /// A required text field on a patient registration was left empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A patient NIK was not exactly 16 characters.
    #[error("NIK must be exactly 16 characters: {0:?}")]
    InvalidNik(String),

    /// The NIK is already registered to another patient.
    #[error("NIK {0} is already registered")]
    DuplicateNik(String),

    /// A write referenced a layanan or pasien that does not exist.
    #[error("a referenced layanan or pasien does not exist")]
    InvalidForeignKey,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An amendment proposed a total paid-to-date lower than the amount
    /// already recorded. Payments accumulate and are never rolled back.
    #[error("recorded payment {recorded} cannot be lowered to {proposed}")]
    PaymentRegression {
        /// The total paid-to-date currently stored on the header.
        recorded: f64,
        /// The lower total the amendment attempted to store.
        proposed: f64,
    },

    /// A create or amend operation ended with zero line items inserted.
    ///
    /// A committed transaction header must always own at least one line
    /// item, so the whole unit of work is rolled back.
    #[error("transaction write finished with zero line items")]
    DetailNotSaved,

    /// A draft session tried to mirror state to storage before the initial
    /// load completed. Saving at that point would overwrite the stored
    /// draft with empty state.
    #[error("draft must be loaded before it can be saved")]
    DraftNotLoaded,

    /// An error occurred while resolving the clinic timezone from a
    /// canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// An error occurred while serializing or deserializing a draft as JSON.
    #[error("could not (de)serialize draft as JSON: {0}")]
    Json(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidForeignKey,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Json(value.to_string())
    }
}

/// The JSON body returned for every failed request.
///
/// `field` names the offending request field for validation errors so the
/// client can attach the message to the right input.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// A human-readable description of the failure.
    pub message: String,
    /// The request field the failure relates to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl Error {
    /// The request field this error should be attached to, if any.
    fn field(&self) -> Option<&'static str> {
        match self {
            Error::EmptyNamaPasien | Error::NamaPasienTooLong(_) => Some("nama_pasien"),
            Error::EmptyLayanan | Error::DetailNotSaved => Some("layanan_ids"),
            Error::Underpaid { .. } | Error::PaymentRegression { .. } => Some("total_bayar"),
            Error::InvalidNik(_) | Error::DuplicateNik(_) => Some("nik"),
            Error::EmptyField(field) => Some(field),
            _ => None,
        }
    }

    /// The HTTP status code this error maps to.
    fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyNamaPasien
            | Error::NamaPasienTooLong(_)
            | Error::EmptyLayanan
            | Error::EmptyField(_)
            | Error::Underpaid { .. }
            | Error::InvalidNik(_)
            | Error::DuplicateNik(_)
            | Error::InvalidForeignKey
            | Error::PaymentRegression { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DraftNotLoaded => StatusCode::CONFLICT,
            Error::DetailNotSaved
            | Error::InvalidTimezone(_)
            | Error::Json(_)
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = match &self {
            // Internal details are logged on the server, never shown to the
            // client.
            Error::SqlError(_) | Error::Json(_) | Error::InvalidTimezone(_) => {
                tracing::error!("An unexpected error occurred: {}", self);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (
            status_code,
            Json(ErrorBody {
                message,
                field: self.field(),
            }),
        )
            .into_response()
    }
}
