//! Defines the endpoint for searching registered patients.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, pasien::search_pasien};

/// The state needed to search the patient directory.
#[derive(Debug, Clone)]
pub struct SearchPasienState {
    /// The database connection for reading the patient directory.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SearchPasienState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for a patient search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchPasienQuery {
    /// The text to match against patient NIKs and names.
    pub search: Option<String>,
}

/// A route handler that searches registered patients by NIK or name.
///
/// Queries shorter than three characters return an empty list rather than
/// an error: the transaction screen fires a request per keystroke and short
/// prefixes are expected.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn search_pasien_endpoint(
    State(state): State<SearchPasienState>,
    Query(query): Query<SearchPasienQuery>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();

    match search_pasien(query.search.as_deref().unwrap_or_default(), &connection) {
        Ok(results) => Json(results).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        pasien::{Nik, Pasien, create_pasien},
    };

    use super::{SearchPasienQuery, SearchPasienState, search_pasien_endpoint};

    fn get_test_state() -> SearchPasienState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_pasien(
            &Pasien {
                nik: Nik::new_unchecked("3201234567890001"),
                nama: "Budi Santoso".to_owned(),
                alamat: "Jl. Merdeka No. 1".to_owned(),
            },
            &conn,
        )
        .unwrap();

        SearchPasienState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn returns_matches_for_query() {
        let state = get_test_state();
        let query = SearchPasienQuery {
            search: Some("Budi".to_owned()),
        };

        let response = search_pasien_endpoint(State(state), Query(query)).await;

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Budi Santoso"));
    }

    #[tokio::test]
    async fn short_query_returns_empty_list() {
        let state = get_test_state();
        let query = SearchPasienQuery {
            search: Some("Bu".to_owned()),
        };

        let response = search_pasien_endpoint(State(state), Query(query)).await;

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), b"[]");
    }
}
