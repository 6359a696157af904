//! Route definitions and server setup

use axum::{
    Router,
    http::{HeaderName, StatusCode},
    middleware,
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::app::AppState;
use crate::presentation::{
    controllers::{health::health_check, rides::create_ride},
    middleware::{idempotency_middleware, logging_middleware, rate_limit_middleware},
};

/// Create the application router
pub fn create_router(app_state: AppState) -> Router {
    let config = app_state.config.clone();

    let mut ride_routes = Router::new().route("/rides", post(create_ride));

    // Only side-effecting routes claim idempotency keys
    if config.idempotency.enabled {
        ride_routes = ride_routes.route_layer(middleware::from_fn_with_state(
            app_state.idempotency.clone(),
            idempotency_middleware,
        ));
    }

    let mut api_routes = Router::new().merge(ride_routes);

    // Added last so it runs before the idempotency claim
    if app_state.rate_limiter.is_enabled() {
        api_routes = api_routes.route_layer(middleware::from_fn_with_state(
            app_state.rate_limiter.clone(),
            rate_limit_middleware,
        ));
    }

    let health_routes = Router::new().route("/health", get(health_check));

    // Build CORS layer from configuration
    let cors_base = if config.server.allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(tower_http::cors::AllowOrigin::mirror_request())
    } else {
        let mut layer = CorsLayer::new();
        for origin in &config.server.allowed_origins {
            match axum::http::HeaderValue::from_str(origin) {
                Ok(origin_header) => {
                    layer = layer.allow_origin(origin_header);
                }
                Err(_) => {
                    tracing::warn!(origin, "Invalid CORS origin in config; skipping");
                }
            }
        }
        layer
    };

    let mut allowed_headers = vec![
        axum::http::header::CONTENT_TYPE,
        axum::http::header::AUTHORIZATION,
        axum::http::header::ACCEPT,
        axum::http::header::ORIGIN,
    ];
    for name in [
        &config.idempotency.header_name,
        &config.idempotency.subject_header,
    ] {
        match HeaderName::from_bytes(name.as_bytes()) {
            Ok(header) => allowed_headers.push(header),
            Err(_) => tracing::warn!(header = %name, "Invalid header name in config; skipping"),
        }
    }

    let cors_layer = cors_base
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(allowed_headers)
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            axum::http::header::RETRY_AFTER,
        ])
        .allow_credentials(false)
        .max_age(Duration::from_secs(3600));

    let service_builder = ServiceBuilder::new()
        // HTTP tracing
        .layer(TraceLayer::new_for_http())
        // CORS handling
        .layer(cors_layer)
        // Request timeout
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_seconds),
        ))
        // Custom logging middleware
        .layer(middleware::from_fn(logging_middleware));

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(health_routes)
        .layer(service_builder)
        .with_state(app_state)
}
