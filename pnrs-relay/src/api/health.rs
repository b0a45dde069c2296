//! Health check endpoint
//!
//! Reports whether both collections answer a query. A failing store turns the
//! response into 503 so a load balancer stops routing transfers here.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use pnrs_common::Collection;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub collections: Vec<CollectionHealth>,
}

/// Status of one collection
#[derive(Debug, Serialize)]
pub struct CollectionHealth {
    pub name: String,
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn check_collection(collection: &Collection) -> CollectionHealth {
    let (documents, error) = match collection.count().await {
        Ok(count) => (Some(count), None),
        Err(e) => (None, Some(e.to_string())),
    };

    CollectionHealth {
        name: collection.name().to_string(),
        role: collection.role().as_str(),
        documents,
        error,
    }
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let collections = vec![
        check_collection(&state.source).await,
        check_collection(&state.destination).await,
    ];
    let healthy = collections.iter().all(|c| c.error.is_none());

    let (code, status) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            module: "pnrs-relay",
            version: env!("CARGO_PKG_VERSION"),
            collections,
        }),
    )
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
