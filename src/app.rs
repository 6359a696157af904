//! Application wiring shared by the binary and the router tests

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use ridegate_core::Config;
use ridegate_core::domain::StoreError;
use ridegate_core::infrastructure::store::{SharedStore, connect_store, start_cleanup_task};

use crate::presentation::{IdempotencyState, RateLimiterState, create_router};

/// State shared by handlers and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn SharedStore>,
    pub rate_limiter: Arc<RateLimiterState>,
    pub idempotency: Arc<IdempotencyState>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn SharedStore>) -> Self {
        let rate_limiter = Arc::new(RateLimiterState::new(
            Arc::clone(&store),
            config.rate_limit.clone(),
            &config.idempotency.subject_header,
        ));
        let idempotency = Arc::new(IdempotencyState::new(
            Arc::clone(&store),
            config.idempotency.clone(),
        ));

        Self {
            config: Arc::new(config),
            store,
            rate_limiter,
            idempotency,
        }
    }
}

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
    pub background_tasks: Vec<JoinHandle<()>>,
}

/// Build the configured store backend and the application around it.
///
/// Never blocks on the store: the Dragonfly backend connects on first use.
pub async fn create_app(config: Config) -> Result<AppHandle, StoreError> {
    let store = connect_store(&config.store)?;
    Ok(create_app_with_store(config, store))
}

/// Build the application around an already constructed store
pub fn create_app_with_store(config: Config, store: Arc<dyn SharedStore>) -> AppHandle {
    let shutdown_token = CancellationToken::new();

    let cleanup_interval = Duration::from_secs(config.store.cleanup_interval_seconds);
    let cleanup_task = start_cleanup_task(
        Arc::clone(&store),
        cleanup_interval,
        shutdown_token.clone(),
    );

    tracing::info!(
        rate_limit_enabled = config.rate_limit.enabled,
        limit = config.rate_limit.limit,
        window_seconds = config.rate_limit.window_seconds,
        idempotency_enabled = config.idempotency.enabled,
        "Request guards configured"
    );

    let router = create_router(AppState::new(config, store));

    AppHandle {
        router,
        shutdown_token,
        background_tasks: vec![cleanup_task],
    }
}
