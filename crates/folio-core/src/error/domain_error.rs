//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Caller Errors
    // =========================================================================
    #[error("Authentication required")]
    AuthRequired,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Content rejected: {0}")]
    ValidationFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Comment has {replies} replies; confirm to delete")]
    ConfirmationRequired { replies: i32 },

    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Project not found: {0}")]
    ProjectNotFound(Snowflake),

    #[error("Comment not found: {0}")]
    CommentNotFound(Snowflake),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Store failure: {0}")]
    StoreFailure(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::ConfirmationRequired { .. } => "CONFIRMATION_REQUIRED",
            Self::ProjectNotFound(_) => "UNKNOWN_PROJECT",
            Self::CommentNotFound(_) => "UNKNOWN_COMMENT",
            Self::StoreFailure(_) => "STORE_FAILURE",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Short text suitable for showing to the person who triggered the error
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "Sign in to continue".to_string(),
            Self::InvalidArgument(msg) | Self::ValidationFailed(msg) => msg.clone(),
            Self::PermissionDenied(msg) => msg.clone(),
            Self::ConfirmationRequired { replies } => {
                format!("This comment has {replies} replies. Confirm to delete it")
            }
            Self::ProjectNotFound(_) => "Project not found".to_string(),
            Self::CommentNotFound(_) => "Comment not found".to_string(),
            Self::StoreFailure(_) => "Could not save your change, please try again".to_string(),
            Self::CacheError(_) | Self::InternalError(_) => "Something went wrong".to_string(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProjectNotFound(_) | Self::CommentNotFound(_))
    }

    /// Check if this is a caller input error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::ValidationFailed(_))
    }

    /// Check if this is an authentication or authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::PermissionDenied(_))
    }

    /// Backing store or cache failed; the caller may re-issue the action
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreFailure(_) | Self::CacheError(_))
    }
}
