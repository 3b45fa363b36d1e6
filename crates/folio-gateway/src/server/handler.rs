//! WebSocket handler
//!
//! Runs one connection: a reader that dispatches client ops, a writer that
//! drains the connection's outgoing queue, and a heartbeat watchdog.

use crate::connection::Connection;
use crate::handlers::MessageDispatcher;
use crate::protocol::{
    CloseCode, GatewayMessage, HelloPayload, HEARTBEAT_INTERVAL_MS, HEARTBEAT_TIMEOUT_MS,
};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;

/// Channel buffer size for outgoing messages
const MESSAGE_BUFFER_SIZE: usize = 100;

/// How long the writer gets to flush a close frame
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

enum Ended {
    Reader(Option<CloseCode>),
    Writer,
    Heartbeat(CloseCode),
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let session_id = Connection::generate_session_id();
    let (tx, mut rx) = mpsc::channel::<GatewayMessage>(MESSAGE_BUFFER_SIZE);
    let connection = state
        .connection_manager()
        .add_connection(session_id.clone(), tx);

    tracing::info!(session_id = %session_id, "WebSocket connection established");

    let (mut ws_sink, mut ws_stream) = socket.split();

    if write(&mut ws_sink, &GatewayMessage::hello(HelloPayload::new()))
        .await
        .is_err()
    {
        tracing::warn!(session_id = %session_id, "Failed to send Hello message");
        cleanup_connection(&state, &session_id).await;
        return;
    }

    // Reader
    let state_recv = state.clone();
    let connection_recv = connection.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            let session_id = connection_recv.session_id();
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(close_code) =
                        handle_text_message(&state_recv, &connection_recv, &text).await
                    {
                        return Some(close_code);
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(session_id = %session_id, "Binary messages not supported");
                    return Some(CloseCode::DecodeError);
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id, "Client closed connection");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "WebSocket error");
                    return None;
                }
            }
        }
        None
    });

    // Writer
    let (close_tx, mut close_rx) = oneshot::channel::<CloseCode>();
    let session_id_send = session_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    if write(&mut ws_sink, &msg).await.is_err() {
                        tracing::warn!(session_id = %session_id_send, "Failed to send message to WebSocket");
                        return;
                    }
                }
                code = &mut close_rx => {
                    if let Ok(code) = code {
                        let (code, reason) = GatewayMessage::close_frame(code);
                        let frame = CloseFrame { code, reason: reason.into() };
                        ws_sink.send(Message::Close(Some(frame))).await.ok();
                    }
                    break;
                }
            }
        }
        ws_sink.close().await.ok();
    });

    // Heartbeat watchdog
    let connection_hb = connection.clone();
    let mut heartbeat_task = tokio::spawn(async move {
        let mut check_interval = interval(Duration::from_millis(HEARTBEAT_INTERVAL_MS / 2));
        loop {
            check_interval.tick().await;
            let silent_for = connection_hb.time_since_heartbeat().await;
            if silent_for > Duration::from_millis(HEARTBEAT_TIMEOUT_MS) {
                tracing::warn!(
                    session_id = %connection_hb.session_id(),
                    silent_ms = silent_for.as_millis(),
                    "Connection timed out (no heartbeat)"
                );
                return CloseCode::SessionTimeout;
            }
        }
    });

    let ended = tokio::select! {
        result = &mut recv_task => Ended::Reader(result.ok().flatten()),
        _ = &mut send_task => Ended::Writer,
        result = &mut heartbeat_task => match result {
            Ok(code) => Ended::Heartbeat(code),
            Err(_) => Ended::Heartbeat(CloseCode::UnknownError),
        },
    };
    recv_task.abort();
    heartbeat_task.abort();

    match ended {
        Ended::Writer => {
            tracing::debug!(session_id = %session_id, "Send task ended");
        }
        Ended::Reader(code) => finish_writer(&session_id, close_tx, send_task, code).await,
        Ended::Heartbeat(code) => finish_writer(&session_id, close_tx, send_task, Some(code)).await,
    }

    let subscriptions = connection.subscription_count().await;
    tracing::info!(
        session_id = %session_id,
        duration_secs = connection.age().as_secs(),
        subscriptions = subscriptions,
        "WebSocket connection closed"
    );
    cleanup_connection(&state, &session_id).await;
}

/// Ask the writer to send a close frame (if any) and give it time to flush
async fn finish_writer(
    session_id: &str,
    close_tx: oneshot::Sender<CloseCode>,
    send_task: tokio::task::JoinHandle<()>,
    code: Option<CloseCode>,
) {
    match code {
        Some(code) => {
            tracing::debug!(session_id = %session_id, close_code = %code, "Closing connection");
            close_tx.send(code).ok();
        }
        None => drop(close_tx),
    }

    if tokio::time::timeout(CLOSE_GRACE, send_task).await.is_err() {
        tracing::debug!(session_id = %session_id, "Writer did not finish in time");
    }
}

async fn write(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &GatewayMessage,
) -> Result<(), axum::Error> {
    match message.to_json() {
        Ok(json) => sink.send(Message::Text(json)).await,
        Err(e) => {
            tracing::error!(error = %e, message = %message, "Failed to encode gateway message");
            Ok(())
        }
    }
}

/// Handle a text message from the client
async fn handle_text_message(
    state: &GatewayState,
    connection: &Arc<Connection>,
    text: &str,
) -> Result<(), CloseCode> {
    let message = GatewayMessage::from_json(text).map_err(|e| {
        tracing::debug!(
            session_id = %connection.session_id(),
            error = %e,
            "Failed to parse message"
        );
        CloseCode::DecodeError
    })?;

    tracing::trace!(
        session_id = %connection.session_id(),
        op = %message.op,
        "Received message"
    );

    MessageDispatcher::dispatch(state, connection, message)
        .await
        .map_err(|e| {
            tracing::warn!(
                session_id = %connection.session_id(),
                error = %e,
                "Handler error"
            );
            e.to_close_code()
        })
}

async fn cleanup_connection(state: &GatewayState, session_id: &str) {
    tracing::info!(session_id = %session_id, "Cleaning up connection");
    state.connection_manager().remove_connection(session_id).await;
}
