//! HTTP middleware for the web server

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use ridegate_core::config::{IdempotencyConfig, RateLimitConfig, StoreFailurePolicy};
use ridegate_core::domain::GuardError;
use ridegate_core::infrastructure::idempotency::{ClaimOutcome, IdempotencyGate, OperationKey};
use ridegate_core::infrastructure::rate_limiter::{
    RateLimitKey, RateLimitResult, RateLimiterService, TOO_MANY_REQUESTS,
};
use ridegate_core::infrastructure::store::SharedStore;

use crate::presentation::models::error_response;

pub const DUPLICATE_OPERATION: &str = "Duplicate operation";
pub const IDEMPOTENCY_KEY_REQUIRED: &str = "Idempotency key required";
pub const SERVICE_UNAVAILABLE: &str = "Service temporarily unavailable";

/// Subject used for idempotency keys when the upstream auth layer sent none
const ANONYMOUS_SUBJECT: &str = "anonymous";

/// Logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Processing request"
    );

    let response = next.run(request).await;
    let duration = start_time.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Client address for rate limiting.
///
/// Proxy headers win when trusted; otherwise the socket address recorded by
/// `into_make_service_with_connect_info`.
pub fn client_ip(request: &Request, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let forwarded = header_str(request.headers(), "x-forwarded-for")
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| header_str(request.headers(), "x-real-ip").map(str::trim))
            .filter(|s| !s.is_empty());

        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown-ip".to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Rate limiter middleware state
pub struct RateLimiterState {
    service: RateLimiterService,
    config: RateLimitConfig,
    subject_header: String,
}

impl RateLimiterState {
    pub fn new(store: Arc<dyn SharedStore>, config: RateLimitConfig, subject_header: &str) -> Self {
        Self {
            service: RateLimiterService::new(store, config.clone()),
            config,
            subject_header: subject_header.to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.service.is_enabled()
    }

    /// Get the rate limit bucket for a request
    pub fn get_key(&self, request: &Request) -> RateLimitKey {
        let ip = client_ip(request, self.config.trust_proxy_headers);
        let subject = header_str(request.headers(), &self.subject_header);
        RateLimitKey::for_strategy(self.config.strategy, &ip, subject)
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimiterState>>,
    request: Request,
    next: Next,
) -> Response {
    let key = state.get_key(&request);

    match state.service.check(&key).await {
        Ok(RateLimitResult::Allowed {
            limit, remaining, ..
        }) => {
            let mut response = next.run(request).await;

            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));

            response
        }
        Ok(RateLimitResult::Limited {
            count,
            limit,
            retry_after,
        }) => {
            tracing::warn!(
                key = %key,
                count = count,
                retry_after = retry_after,
                "Rate limit exceeded"
            );

            let mut response = error_response(StatusCode::TOO_MANY_REQUESTS, TOO_MANY_REQUESTS);

            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
            headers.insert("retry-after", HeaderValue::from(retry_after));

            response
        }
        Err(e) => {
            on_guard_error(state.config.on_store_error, "rate_limit", e, request, next).await
        }
    }
}

/// Idempotency middleware state
pub struct IdempotencyState {
    gate: IdempotencyGate,
    config: IdempotencyConfig,
}

impl IdempotencyState {
    pub fn new(store: Arc<dyn SharedStore>, config: IdempotencyConfig) -> Self {
        Self {
            gate: IdempotencyGate::from_config(store, &config),
            config,
        }
    }

    /// Build `{subject}:{operation}` from the request headers
    pub fn get_key(&self, request: &Request) -> OperationKey {
        let operation = header_str(request.headers(), &self.config.header_name).unwrap_or("");
        let subject = header_str(request.headers(), &self.config.subject_header)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(ANONYMOUS_SUBJECT);

        OperationKey::new(subject, operation)
    }
}

/// Idempotency middleware: lets only the first request per key reach the handler
pub async fn idempotency_middleware(
    State(state): State<Arc<IdempotencyState>>,
    request: Request,
    next: Next,
) -> Response {
    let key = state.get_key(&request);

    match state.gate.claim(&key).await {
        Ok(ClaimOutcome::FirstClaim) => next.run(request).await,
        Ok(ClaimOutcome::Duplicate) => {
            tracing::info!(key = %key, "Duplicate operation rejected");
            error_response(StatusCode::CONFLICT, DUPLICATE_OPERATION)
        }
        Ok(ClaimOutcome::MissingKey) => {
            tracing::debug!(
                header = %state.config.header_name,
                "Request without idempotency key rejected"
            );
            error_response(StatusCode::BAD_REQUEST, IDEMPOTENCY_KEY_REQUIRED)
        }
        Err(e) => {
            on_guard_error(state.config.on_store_error, "idempotency", e, request, next).await
        }
    }
}

/// Apply the configured failure policy when a guard could not reach a verdict
async fn on_guard_error(
    policy: StoreFailurePolicy,
    guard: &'static str,
    error: GuardError,
    request: Request,
    next: Next,
) -> Response {
    match policy {
        StoreFailurePolicy::Allow => {
            tracing::warn!(guard, error = %error, "Guard unavailable, letting request through");
            next.run(request).await
        }
        StoreFailurePolicy::Reject => {
            tracing::error!(guard, error = %error, "Guard unavailable, rejecting request");
            error_response(StatusCode::SERVICE_UNAVAILABLE, SERVICE_UNAVAILABLE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().uri("/api/v1/rides");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_client_ip_prefers_first_forwarded_address() {
        let request = request_with(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(client_ip(&request, true), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_ignores_untrusted_headers() {
        let mut request = request_with(&[("x-forwarded-for", "203.0.113.7")]);
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 4711))));

        assert_eq!(client_ip(&request, false), "192.0.2.10");
    }

    #[test]
    fn test_client_ip_unknown_without_any_source() {
        assert_eq!(client_ip(&request_with(&[]), true), "unknown-ip");
    }

    #[test]
    fn test_idempotency_key_uses_subject_header() {
        let state = IdempotencyState::new(
            Arc::new(ridegate_core::infrastructure::store::InMemoryStore::new()),
            IdempotencyConfig::default(),
        );

        let request = request_with(&[("idempotency-key", "req-1"), ("x-subject-id", "rider-5")]);
        assert_eq!(state.get_key(&request).as_str(), "rider-5:req-1");

        let request = request_with(&[("idempotency-key", "req-1")]);
        assert_eq!(state.get_key(&request).as_str(), "anonymous:req-1");

        assert!(state.get_key(&request_with(&[])).is_empty());
    }
}
