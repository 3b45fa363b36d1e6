//! Route definitions
//!
//! All API routes organized by domain and mounted under /api/v1.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{comments, health, reactions};
use crate::state::AppState;

/// Create the main API router with all routes (excluding health for separate middleware handling)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(reaction_routes())
        .merge(comment_routes())
}

/// Reaction routes
fn reaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_id/reactions",
            get(reactions::get_reaction_summary).post(reactions::toggle_reaction),
        )
        .route(
            "/projects/:project_id/reactions/users",
            get(reactions::get_reactors),
        )
        .route(
            "/projects/:project_id/reactions/reconcile",
            post(reactions::reconcile_reactions),
        )
}

/// Comment routes
fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/comments/:comment_id",
            get(comments::get_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/comments/:comment_id/replies", get(comments::get_replies))
}
