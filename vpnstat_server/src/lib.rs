//! vpnstat collector: authenticated report ingestion, a bounded rolling
//! history, and Mini App identity verification over HTTP.

pub mod api;
pub mod config;
pub mod gateway;
pub mod history;
pub mod identity;
pub mod state;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/stats/report", post(api::report))
        .route("/api/stats", get(api::stats))
        .route("/api/servers", get(api::servers))
        .route("/api/me", post(api::me))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
