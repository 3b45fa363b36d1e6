//! Identify handler (op 2)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::events::{GatewayEventType, ReadyEvent};
use crate::protocol::IdentifyPayload;
use crate::server::GatewayState;
use std::sync::Arc;

pub struct IdentifyHandler;

impl IdentifyHandler {
    /// Verify the access token, attach the user and answer with READY
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: IdentifyPayload,
    ) -> HandlerResult<()> {
        if connection.is_identified().await {
            tracing::warn!(
                session_id = %connection.session_id(),
                "Client sent Identify while already identified"
            );
            return Err(HandlerError::AlreadyAuthenticated);
        }

        let actor = state
            .service_context()
            .jwt_service()
            .authenticate(payload.bare_token())
            .map_err(|e| {
                tracing::debug!(error = %e, "Token validation failed");
                HandlerError::AuthenticationFailed(e.to_string())
            })?;

        let session_id = connection.session_id().to_string();
        state
            .connection_manager()
            .identify_connection(&session_id, actor)
            .await;

        let ready = ReadyEvent {
            session_id: session_id.clone(),
            user_id: actor.user_id,
            subscriptions: connection.subscriptions().await,
        };
        connection
            .dispatch(GatewayEventType::Ready, serde_json::to_value(&ready)?)
            .await
            .map_err(|_| HandlerError::ConnectionClosed)?;

        tracing::info!(
            session_id = %session_id,
            user_id = %actor.user_id,
            role = actor.role.as_str(),
            "Client identified"
        );

        Ok(())
    }
}
