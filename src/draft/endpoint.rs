//! Defines the endpoints for reading, mirroring, and discarding the
//! per-admin draft.
//!
//! The transaction screen owns the draft state and mirrors it here on
//! every change. The server stores the draft verbatim and returns the
//! derived settlement figures alongside it, so the screen never computes
//! money on its own.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState,
    actor::ActorId,
    draft::{Draft, Settlement, clear_draft, load_draft, save_draft},
};

/// The state needed to serve the draft endpoints.
#[derive(Debug, Clone)]
pub struct DraftState {
    /// The database connection that holds the stored drafts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DraftState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A draft together with its derived settlement figures.
#[derive(Debug, Serialize)]
pub struct DraftView {
    /// The draft as stored.
    #[serde(flatten)]
    pub draft: Draft,
    /// The money figures derived from the draft.
    #[serde(flatten)]
    pub settlement: Settlement,
    /// Whether submission would be blocked for underpayment.
    pub kurang: bool,
}

impl From<Draft> for DraftView {
    fn from(draft: Draft) -> Self {
        let settlement = draft.settlement();
        let kurang = draft.is_underpaid();

        Self {
            draft,
            settlement,
            kurang,
        }
    }
}

/// A route handler that returns the acting admin's stored draft, or an
/// empty one if nothing is stored.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn get_draft_endpoint(State(state): State<DraftState>, actor: ActorId) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match load_draft(actor.0, &connection) {
        Ok(draft) => Json(DraftView::from(draft.unwrap_or_default())).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler that stores the acting admin's draft, replacing any
/// previous one, and returns it with fresh settlement figures.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn put_draft_endpoint(
    State(state): State<DraftState>,
    actor: ActorId,
    Json(draft): Json<Draft>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match save_draft(actor.0, &draft, &connection) {
        Ok(()) => Json(DraftView::from(draft)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler that discards the acting admin's stored draft.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn delete_draft_endpoint(State(state): State<DraftState>, actor: ActorId) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match clear_draft(actor.0, &connection) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod draft_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, body::to_bytes, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        actor::ActorId,
        db::initialize,
        draft::{Draft, DraftLayanan, load_draft},
    };

    use super::{DraftState, delete_draft_endpoint, get_draft_endpoint, put_draft_endpoint};

    fn get_test_state() -> DraftState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        DraftState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn test_draft() -> Draft {
        Draft {
            nama_pasien: "Budi Santoso".to_owned(),
            nik_pasien: None,
            layanan: vec![
                DraftLayanan {
                    id_layanan: 1,
                    nama_layanan: "Konsultasi Dokter Umum".to_owned(),
                    total_harga: 50_000.0,
                },
                DraftLayanan {
                    id_layanan: 2,
                    nama_layanan: "Pemeriksaan Laboratorium".to_owned(),
                    total_harga: 30_000.0,
                },
            ],
            bayar: 100_000.0,
            amendment: None,
        }
    }

    #[tokio::test]
    async fn get_without_stored_draft_returns_empty_draft() {
        let state = get_test_state();

        let response = get_draft_endpoint(State(state), ActorId(1)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let view: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(view["nama_pasien"], "");
        assert_eq!(view["total"], 0.0);
        assert_eq!(view["kurang"], false);
    }

    #[tokio::test]
    async fn put_stores_draft_and_returns_settlement() {
        let state = get_test_state();

        let response =
            put_draft_endpoint(State(state.clone()), ActorId(1), Json(test_draft())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let view: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(view["total"], 80_000.0);
        assert_eq!(view["kembalian"], 20_000.0);
        assert_eq!(view["kurang"], false);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(load_draft(1, &connection).unwrap(), Some(test_draft()));
    }

    #[tokio::test]
    async fn drafts_are_scoped_to_the_acting_admin() {
        let state = get_test_state();
        put_draft_endpoint(State(state.clone()), ActorId(1), Json(test_draft())).await;

        let response = get_draft_endpoint(State(state), ActorId(2)).await;

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let view: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(view["nama_pasien"], "");
    }

    #[tokio::test]
    async fn delete_discards_stored_draft() {
        let state = get_test_state();
        put_draft_endpoint(State(state.clone()), ActorId(1), Json(test_draft())).await;

        let response = delete_draft_endpoint(State(state.clone()), ActorId(1)).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(load_draft(1, &connection).unwrap(), None);
    }
}
