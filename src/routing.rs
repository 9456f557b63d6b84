//! Application router configuration.

use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
};

use crate::{
    AppState, Error, endpoints,
    draft::{delete_draft_endpoint, get_draft_endpoint, put_draft_endpoint},
    laporan::{
        get_struk_endpoint, laporan_bulanan_endpoint, laporan_harian_endpoint,
        laporan_mingguan_endpoint,
    },
    layanan::search_layanan_endpoint,
    logging::logging_middleware,
    pasien::{register_pasien_endpoint, search_pasien_endpoint},
    transaksi::{
        amend_transaksi_endpoint, create_transaksi_endpoint, delete_transaksi_endpoint,
        list_transaksi_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::LAYANAN_SEARCH, get(search_layanan_endpoint))
        .route(
            endpoints::PASIEN_SEARCH,
            get(search_pasien_endpoint).post(register_pasien_endpoint),
        )
        .route(
            endpoints::DRAFT,
            get(get_draft_endpoint)
                .put(put_draft_endpoint)
                .delete(delete_draft_endpoint),
        )
        .route(
            endpoints::TRANSAKSI,
            get(list_transaksi_endpoint).post(create_transaksi_endpoint),
        )
        .route(
            endpoints::TRANSAKSI_ITEM,
            put(amend_transaksi_endpoint).delete(delete_transaksi_endpoint),
        )
        .route(endpoints::STRUK, get(get_struk_endpoint))
        .route(endpoints::LAPORAN_HARIAN, get(laporan_harian_endpoint))
        .route(endpoints::LAPORAN_MINGGUAN, get(laporan_mingguan_endpoint))
        .route(endpoints::LAPORAN_BULANAN, get(laporan_bulanan_endpoint))
        .fallback(not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn not_found() -> Response {
    Error::NotFound.into_response()
}
