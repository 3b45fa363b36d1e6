//! Gateway server setup
//!
//! Provides the WebSocket route, state construction and the server runner.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::broadcast::{EventDispatcher, EventDispatcherConfig, EventRouter};
use crate::connection::ConnectionManager;
use axum::{extract::State, routing::get, Json, Router};
use folio_common::{AppConfig, AppError};
use folio_service::ServiceContext;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

/// How often connections whose writer died are swept
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

async fn health_check(State(state): State<GatewayState>) -> Json<Value> {
    let manager = state.connection_manager();
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": manager.connection_count(),
        "users": manager.user_count(),
        "relay": state.event_dispatcher().is_some_and(EventDispatcher::is_running),
    }))
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect the stores from configuration and build the gateway state
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let service_context = Arc::new(ServiceContext::connect(&config).await?);
    create_gateway_state_with_context(service_context, config).await
}

/// Build the gateway state over an existing service context
///
/// Changes published through the context's bridge reach gateway clients
/// directly. With Redis configured, changes relayed by other processes are
/// delivered as well; a context shared with an API server should then have
/// no relay of its own, or clients see each change twice.
pub async fn create_gateway_state_with_context(
    service_context: Arc<ServiceContext>,
    config: AppConfig,
) -> Result<GatewayState, AppError> {
    let connection_manager = ConnectionManager::new_shared();

    let event_dispatcher = match &config.redis {
        Some(redis) => {
            let router = EventRouter::new(
                service_context.bridge().clone(),
                connection_manager.clone(),
            );
            let dispatcher_config = EventDispatcherConfig {
                redis_url: redis.url.clone(),
                ..EventDispatcherConfig::default()
            };
            let dispatcher = EventDispatcher::new(dispatcher_config, router)
                .await
                .map_err(|e| AppError::Cache(format!("Failed to create event dispatcher: {e}")))?;
            let dispatcher = Arc::new(dispatcher);
            dispatcher.clone().start();
            Some(dispatcher)
        }
        None => {
            tracing::warn!("REDIS_URL not set, only changes made in this process reach gateway clients");
            None
        }
    };

    Ok(GatewayState::new(
        service_context,
        connection_manager,
        event_dispatcher,
        config,
    ))
}

/// Periodically drop connections whose writer has gone away
pub fn spawn_connection_cleanup(state: GatewayState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            state.connection_manager().cleanup_closed_connections().await;
        }
    })
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(config).await?;
    let cleanup = spawn_connection_cleanup(state.clone());

    let result = run_server(create_app(state.clone()), addr).await;

    cleanup.abort();
    if let Some(dispatcher) = state.event_dispatcher() {
        dispatcher.stop().await;
    }
    result
}
