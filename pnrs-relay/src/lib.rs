//! pnrs-relay library - Phone Number Relay Service
//!
//! Copies person records from a source collection into a destination
//! collection under an investigation id, and reads them back.

use axum::Router;
use pnrs_common::Collection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod query;
pub mod transfer;

pub use query::{get_by_investigation, InvestigationRecord};
pub use transfer::{transfer, TransferReport};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Externally managed records, only ever read
    pub source: Collection,
    /// Tagged copies
    pub destination: Collection,
}

impl AppState {
    /// Create new application state
    pub fn new(source: Collection, destination: Collection) -> Self {
        Self {
            source,
            destination,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route(
            "/investigation/:invest_id/numbers",
            get(api::get_investigation_numbers).post(api::transfer_numbers),
        )
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
