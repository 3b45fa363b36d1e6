//! Handler error types

use crate::protocol::{CloseCode, OpCode};
use thiserror::Error;

/// Failures that end the connection
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Op code {0} cannot be sent by clients")]
    UnexpectedOpcode(OpCode),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Already authenticated")]
    AlreadyAuthenticated,

    #[error("Subscription limit of {0} reached")]
    TooManySubscriptions(usize),

    #[error("Service error: {0}")]
    Service(#[from] folio_service::ServiceError),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writer task is gone
    #[error("Connection closed")]
    ConnectionClosed,
}

impl HandlerError {
    /// Close code sent to the client for this error
    pub fn to_close_code(&self) -> CloseCode {
        match self {
            Self::UnexpectedOpcode(_) => CloseCode::UnknownOpcode,
            Self::InvalidPayload(_) => CloseCode::DecodeError,
            Self::AuthenticationFailed(_) => CloseCode::AuthenticationFailed,
            Self::AlreadyAuthenticated => CloseCode::AlreadyAuthenticated,
            Self::TooManySubscriptions(_) => CloseCode::TooManySubscriptions,
            Self::Service(_) | Self::Encode(_) | Self::ConnectionClosed => CloseCode::UnknownError,
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
