//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode};

use crate::app::AppState;
use crate::presentation::models::HealthResponse;

/// Liveness plus shared store reachability.
///
/// Answers 503 while the store is unreachable so load balancers can tell a
/// degraded instance apart from a healthy one.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION");

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                store: "up",
                version,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach shared store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    store: "down",
                    version,
                }),
            )
        }
    }
}
