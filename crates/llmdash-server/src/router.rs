//! Dashboard API routes.

use std::sync::Arc;

use axum::{Router, routing::get};
use llmdash_config::DashboardConfig;
use llmdash_usage::{LogStore, QuerySettings, UsageQuery};
use tower_http::cors::CorsLayer;

use crate::handlers::{
    get_date_bounds, get_debug_info, get_models, get_top_cost_records, get_usage, health,
};

/// Shared handler state. Immutable once the server starts.
#[derive(Clone)]
pub struct AppState {
    pub query: Arc<UsageQuery>,
}

impl AppState {
    pub fn new(query: UsageQuery) -> Self {
        Self {
            query: Arc::new(query),
        }
    }

    /// Build state from loaded configuration.
    pub fn from_config(config: &DashboardConfig) -> Self {
        let store = LogStore::new(&config.store.path, &config.store.marker);
        let settings = QuerySettings {
            top_records_limit: config.query.top_records_limit,
            fallback_window_days: config.query.fallback_window_days,
        };
        Self::new(UsageQuery::new(store, settings))
    }
}

/// Create the dashboard router.
///
/// Routes are served at the root and again under `/api` with the names the
/// browser UI uses.
pub fn create_router(state: AppState, cors: bool) -> Router {
    let legacy = Router::new()
        .route("/date-range", get(get_date_bounds))
        .route("/models", get(get_models))
        .route("/token-data", get(get_usage))
        .route("/sample-records", get(get_top_cost_records))
        .route("/debug-info", get(get_debug_info));

    let router = Router::new()
        .route("/health", get(health))
        .route("/date-bounds", get(get_date_bounds))
        .route("/models", get(get_models))
        .route("/usage", get(get_usage))
        .route("/top-cost-records", get(get_top_cost_records))
        .route("/debug-info", get(get_debug_info))
        .nest("/api", legacy)
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
