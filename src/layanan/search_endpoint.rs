//! Defines the endpoint for searching the service catalog.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState,
    layanan::{popular_layanan, search_layanan},
};

/// How many services the popularity ranking returns for an empty query.
const POPULAR_LIMIT: u32 = 10;

/// The state needed to search the service catalog.
#[derive(Debug, Clone)]
pub struct SearchLayananState {
    /// The database connection for reading the catalog.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SearchLayananState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for a catalog search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchLayananQuery {
    /// The text to match against service names and IDs.
    pub search: Option<String>,
}

/// A route handler that searches the service catalog.
///
/// With a non-empty `search` parameter this returns every matching service.
/// Without one it returns the popular-services ranking instead, which is
/// what the transaction screen shows before the user starts typing.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn search_layanan_endpoint(
    State(state): State<SearchLayananState>,
    Query(query): Query<SearchLayananQuery>,
) -> Response {
    let connection = state.db_connection.lock().unwrap();
    let search = query.search.as_deref().unwrap_or_default().trim();

    if search.is_empty() {
        match popular_layanan(POPULAR_LIMIT, &connection) {
            Ok(ranking) => Json(ranking).into_response(),
            Err(error) => error.into_response(),
        }
    } else {
        match search_layanan(search, &connection) {
            Ok(results) => Json(results).into_response(),
            Err(error) => error.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use rusqlite::Connection;

    use crate::{db::initialize, layanan::create_layanan};

    use super::{SearchLayananQuery, SearchLayananState, search_layanan_endpoint};

    fn get_test_state() -> SearchLayananState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_layanan("Konsultasi Dokter Umum", 50_000.0, &conn).unwrap();
        create_layanan("Pemeriksaan Laboratorium", 75_000.0, &conn).unwrap();

        SearchLayananState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    #[tokio::test]
    async fn returns_matches_for_query() {
        let state = get_test_state();
        let query = SearchLayananQuery {
            search: Some("lab".to_owned()),
        };

        let response = search_layanan_endpoint(State(state), Query(query)).await;

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Pemeriksaan Laboratorium"));
        assert!(!body.contains("Konsultasi Dokter Umum"));
    }

    #[tokio::test]
    async fn empty_query_returns_popularity_ranking() {
        let state = get_test_state();

        let response =
            search_layanan_endpoint(State(state), Query(SearchLayananQuery::default())).await;

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("transaction_count"));
        assert!(body.contains("Konsultasi Dokter Umum"));
        assert!(body.contains("Pemeriksaan Laboratorium"));
    }
}
