//! Defines the endpoint for listing stored transactions, newest first.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState,
    pagination::{Page, PageQuery, Paginated, PaginationConfig},
    transaksi::{TransaksiRecord, count_transaksi, load_records_page},
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransaksiState {
    /// The database connection for the billing store.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to page the list.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListTransaksiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler that returns one page of transactions with their line
/// items resolved, newest first.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the
/// same thread.
pub async fn list_transaksi_endpoint(
    State(state): State<ListTransaksiState>,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = Page::resolve(&query, &state.pagination_config);
    let connection = state.db_connection.lock().unwrap();

    let total = match count_transaksi(&connection) {
        Ok(total) => total,
        Err(error) => return error.into_response(),
    };

    match load_records_page(page.per_page, page.offset(), &connection) {
        Ok(records) => Json(Paginated::<TransaksiRecord>::new(records, page, total)).into_response(),
        Err(error) => error.into_response(),
    }
}
