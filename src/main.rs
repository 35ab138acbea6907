use std::sync::Arc;

use channel_rpc_server::{
    api::build_registry, build_app, config::Config, dispatch::InputChannelTracker, logging,
    workspace::Workspace, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;

    let workspace = Arc::new(Workspace::new());
    let input_tracker = InputChannelTracker::new();
    // A duplicate method name aborts startup here, before anything is bound.
    let registry = Arc::new(build_registry(&workspace, &input_tracker)?);

    let bind_socket = config.bind_socket()?;
    let state = AppState::new(config.api_token.clone(), registry, input_tracker);
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
