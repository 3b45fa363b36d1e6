//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use folio_common::{AppConfig, AppError};
use folio_service::ServiceContext;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::middleware::{apply_middleware, apply_middleware_with_config};
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    let api = apply_middleware_with_config(
        create_router(),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
    );
    let health = apply_middleware(health_routes());

    api.merge(health).with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    let service_context = ServiceContext::connect(&config).await?;
    Ok(AppState::new(service_context, config))
}

/// Periodically drop expired profile and reply cache entries
pub fn spawn_cache_maintenance(state: AppState) -> JoinHandle<()> {
    let engagement = &state.config().engagement;
    let period = engagement
        .profile_ttl()
        .min(engagement.reply_cache_ttl())
        .max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            let ctx = state.service_context();
            let profiles = ctx.profiles().purge_expired();
            let replies = ctx.replies().purge_expired();
            debug!(profiles, replies, "Purged expired cache entries");
        }
    })
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid API address: {e}")))?;

    let state = create_app_state(config).await?;
    let maintenance = spawn_cache_maintenance(state.clone());

    let app = create_app(state);
    let result = run_server(app, addr).await;

    maintenance.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use folio_core::{Actor, Snowflake};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn test_app() -> (Router, AppState) {
        let state = create_app_state(AppConfig::local("api-test-secret"))
            .await
            .unwrap();
        (create_app(state.clone()), state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn toggle_request(token: Option<&str>, reaction_type: &str) -> Request<Body> {
        let mut builder = Request::post("/api/v1/projects/42/reactions")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
            .body(Body::from(
                serde_json::json!({ "reaction_type": reaction_type }).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let (app, _) = test_app().await;

        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) =
            send(&app, Request::get("/health/ready").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["relay"], "disabled");
    }

    #[tokio::test]
    async fn test_anonymous_toggle_is_unauthorized() {
        let (app, _) = test_app().await;

        let (status, body) = send(&app, toggle_request(None, "like")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn test_bad_token_is_rejected() {
        let (app, _) = test_app().await;

        let (status, body) = send(&app, toggle_request(Some("not-a-jwt"), "like")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_toggle_with_token() {
        let (app, state) = test_app().await;
        let token = state
            .jwt_service()
            .issue_access_token(&Actor::member(Snowflake::new(7)))
            .unwrap();

        let (status, body) = send(&app, toggle_request(Some(&token), "rocket")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["total"], 1);
        assert_eq!(body["summary"]["viewer_reaction"], "rocket");

        let (status, body) = send(&app, toggle_request(Some(&token), "sparkles")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_invalid_path_id() {
        let (app, _) = test_app().await;

        let (status, body) = send(
            &app,
            Request::get("/api/v1/comments/not-a-number")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PATH_PARAMETER");
    }

    #[tokio::test]
    async fn test_unknown_comment_is_not_found() {
        let (app, _) = test_app().await;

        let (status, body) = send(
            &app,
            Request::get("/api/v1/comments/12345").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "UNKNOWN_COMMENT");
        assert_eq!(body["error"]["message"], "Comment not found");
    }
}
