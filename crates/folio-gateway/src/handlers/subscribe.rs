//! Subscribe (op 3) and Unsubscribe (op 4) handlers

use super::{HandlerError, HandlerResult};
use crate::connection::{Connection, DispatchError};
use crate::events::{GatewayEventType, SubscribeFailedEvent, SubscriptionEvent};
use crate::protocol::SubscriptionPayload;
use crate::server::GatewayState;
use folio_core::{DomainError, Snowflake};
use folio_service::realtime::ChangeHandler;
use folio_service::{ChangeEvent, ServiceResult};
use std::sync::Arc;

/// Projects one connection may watch at once
pub const MAX_SUBSCRIPTIONS: usize = 100;

pub struct SubscribeHandler;

impl SubscribeHandler {
    /// Start forwarding a project's changes to the connection
    ///
    /// Subscribing to an already watched project only repeats SUBSCRIBED.
    /// An unknown project is answered with SUBSCRIBE_FAILED and the
    /// connection stays open.
    pub async fn subscribe(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: SubscriptionPayload,
    ) -> HandlerResult<()> {
        let project_id = payload.project_id;

        if !connection.is_subscribed_to(project_id).await {
            if connection.subscription_count().await >= MAX_SUBSCRIPTIONS {
                return Err(HandlerError::TooManySubscriptions(MAX_SUBSCRIPTIONS));
            }

            if let Err(e) = ensure_project(state, project_id).await {
                let failed = SubscribeFailedEvent {
                    project_id,
                    code: e.error_code().to_string(),
                    message: e.user_message(),
                };
                return send(connection, GatewayEventType::SubscribeFailed, &failed).await;
            }

            let subscription = state
                .service_context()
                .bridge()
                .subscribe(project_id, forward_changes(connection));
            connection.add_subscription(subscription).await;

            tracing::debug!(
                session_id = %connection.session_id(),
                project_id = %project_id,
                "Project subscribed"
            );
        }

        send(
            connection,
            GatewayEventType::Subscribed,
            &SubscriptionEvent { project_id },
        )
        .await
    }

    /// Stop forwarding a project's changes; a no-op when not subscribed
    pub async fn unsubscribe(
        connection: &Arc<Connection>,
        payload: SubscriptionPayload,
    ) -> HandlerResult<()> {
        let project_id = payload.project_id;
        let removed = connection.remove_subscription(project_id).await;

        tracing::debug!(
            session_id = %connection.session_id(),
            project_id = %project_id,
            removed,
            "Project unsubscribed"
        );

        send(
            connection,
            GatewayEventType::Unsubscribed,
            &SubscriptionEvent { project_id },
        )
        .await
    }
}

async fn ensure_project(state: &GatewayState, project_id: Snowflake) -> ServiceResult<()> {
    if project_id.is_zero() {
        return Err(DomainError::InvalidArgument("project id is required".to_string()).into());
    }
    if !state.service_context().project_repo().exists(project_id).await? {
        return Err(DomainError::ProjectNotFound(project_id).into());
    }
    Ok(())
}

async fn send<T: serde::Serialize>(
    connection: &Connection,
    event: GatewayEventType,
    payload: &T,
) -> HandlerResult<()> {
    connection
        .dispatch(event, serde_json::to_value(payload)?)
        .await
        .map_err(|_| HandlerError::ConnectionClosed)
}

/// Bridge handler that queues each change on the connection
///
/// Holds the connection weakly so a lingering subscription never keeps a
/// closed socket alive. A full outgoing buffer drops the change; the next
/// change carries full state again.
fn forward_changes(connection: &Arc<Connection>) -> impl ChangeHandler {
    let connection = Arc::downgrade(connection);

    move |event: &ChangeEvent| {
        let Some(connection) = connection.upgrade() else {
            return;
        };

        let data = match serde_json::to_value(event) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(seq = event.seq, error = %e, "Failed to encode change event");
                return;
            }
        };

        if let Err(DispatchError::Full) = connection.try_dispatch(GatewayEventType::Change, data) {
            tracing::warn!(
                session_id = %connection.session_id(),
                project_id = %event.project_id,
                seq = event.seq,
                "Outgoing buffer full, change dropped"
            );
        }
    }
}
