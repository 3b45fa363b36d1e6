//! # folio-service
//!
//! Application layer: the reaction and comment services, the DTOs they
//! return, and the realtime bridge that pushes recomputed views to
//! subscribers.

pub mod dto;
pub mod realtime;
pub mod services;

pub use realtime::{ChangeEvent, ProjectViewState, RealtimeBridge, Subscription};
pub use services::{
    CommentService, ReactionService, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult,
};
