//! Service layer error types
//!
//! Provides a unified error type for all service operations.

use folio_common::{domain_status, AppError};
use folio_core::DomainError;
use std::fmt;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Domain rule violation or store failure
    Domain(DomainError),

    /// Application error (token handling, configuration)
    App(AppError),

    /// Wiring or request-shape problem
    Validation(String),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::App(e) => write!(f, "{e}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::App(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(e) => domain_status(e),
            Self::App(e) => e.status_code(),
            Self::Validation(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Short message for the person who triggered the error
    pub fn user_message(&self) -> String {
        match self {
            Self::Domain(e) => e.user_message(),
            Self::App(e) => e.to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Internal(_) => "Something went wrong".to_string(),
        }
    }

    /// The wrapped domain error, if any
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            Self::App(AppError::Domain(e)) => Some(e),
            _ => None,
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::App(e) => e,
            ServiceError::Validation(msg) => AppError::InvalidInput(msg),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Snowflake;

    #[test]
    fn test_validation_error() {
        let err = ServiceError::validation("ledger is required");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("ledger is required"));
    }

    #[test]
    fn test_domain_errors_keep_their_status() {
        let err = ServiceError::from(DomainError::ConfirmationRequired { replies: 2 });
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "CONFIRMATION_REQUIRED");

        let err = ServiceError::from(DomainError::AuthRequired);
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.user_message(), "Sign in to continue");
    }

    #[test]
    fn test_convert_to_app_error() {
        let app_err: AppError =
            ServiceError::from(DomainError::CommentNotFound(Snowflake::new(4))).into();
        assert_eq!(app_err.status_code(), 404);
        assert_eq!(app_err.error_code(), "UNKNOWN_COMMENT");
    }

    #[test]
    fn test_as_domain() {
        let err = ServiceError::from(AppError::from(DomainError::AuthRequired));
        assert!(matches!(err.as_domain(), Some(DomainError::AuthRequired)));
        assert!(ServiceError::internal("x").as_domain().is_none());
    }
}
