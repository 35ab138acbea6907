use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};

pub mod api;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod logging;
pub mod rpc;
pub mod workspace;

use dispatch::{InputChannelTracker, MethodRegistry};

#[derive(Clone)]
pub struct AppState {
    pub api_token: Arc<str>,
    pub registry: Arc<MethodRegistry>,
    pub input_tracker: InputChannelTracker,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// `registry` must already be frozen; the router only ever reads it.
    pub fn new(
        api_token: String,
        registry: Arc<MethodRegistry>,
        input_tracker: InputChannelTracker,
    ) -> Self {
        Self {
            api_token: Arc::<str>::from(api_token),
            registry,
            input_tracker,
            started_at: Utc::now(),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(http::handlers::RPC_ENDPOINT, post(http::handlers::rpc_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/rpc", get(http::handlers::discovery))
        .merge(protected)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
