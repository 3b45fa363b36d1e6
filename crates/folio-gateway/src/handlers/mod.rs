//! Op code handlers
//!
//! Handles incoming WebSocket messages based on their operation code.

mod error;
mod heartbeat;
mod identify;
mod subscribe;

pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use identify::IdentifyHandler;
pub use subscribe::{SubscribeHandler, MAX_SUBSCRIPTIONS};

use crate::connection::Connection;
use crate::protocol::{GatewayMessage, OpCode};
use crate::server::GatewayState;
use std::sync::Arc;

/// Dispatch incoming client messages to appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle one client message; an error means the connection must close
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message: GatewayMessage,
    ) -> HandlerResult<()> {
        match message.op {
            OpCode::Heartbeat => {
                let seq = message.as_heartbeat_seq().unwrap_or_default();
                HeartbeatHandler::handle(connection, seq).await
            }
            OpCode::Identify => {
                let payload = message.as_identify().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Identify payload".to_string())
                })?;
                IdentifyHandler::handle(state, connection, payload).await
            }
            OpCode::Subscribe => {
                let payload = message.as_subscription().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Subscribe payload".to_string())
                })?;
                SubscribeHandler::subscribe(state, connection, payload).await
            }
            OpCode::Unsubscribe => {
                let payload = message.as_subscription().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Unsubscribe payload".to_string())
                })?;
                SubscribeHandler::unsubscribe(connection, payload).await
            }
            OpCode::Dispatch | OpCode::Hello | OpCode::HeartbeatAck => {
                tracing::warn!(
                    session_id = %connection.session_id(),
                    op = %message.op,
                    "Received server-only op code from client"
                );
                Err(HandlerError::UnexpectedOpcode(message.op))
            }
        }
    }
}
