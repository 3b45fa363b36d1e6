//! Data transfer objects for API requests, responses, and realtime views
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs shared by the REST API and the realtime bridge
//! - The decorator that turns entities into views with author profiles

pub mod mappers;
pub mod requests;
pub mod responses;

pub use mappers::ViewDecorator;

pub use requests::{
    CommentPageQuery, CreateCommentRequest, DeleteCommentQuery, ReactorsQuery,
    ToggleReactionRequest, UpdateCommentRequest, MAX_BODY_CHARS,
};

pub use responses::{
    AuthorView, CommentPageView, CommentView, DeleteCommentOutcome, HealthChecks,
    HealthResponse, ReactionSummaryView, ReactorView, ReadinessResponse, ToggleView,
};
