//! Test helpers for integration tests
//!
//! Spawns the REST API and the gateway over one in-memory service context,
//! makes HTTP requests and drives WebSocket clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use folio_api::AppState;
use folio_common::AppConfig;
use folio_core::{Actor, Role, Snowflake};
use folio_gateway::create_gateway_state_with_context;
use folio_service::ServiceContext;
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const TEST_JWT_SECRET: &str = "integration-test-secret";

/// How long a test waits for one gateway frame
const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// API and gateway servers sharing one service context
pub struct TestServer {
    pub api_addr: SocketAddr,
    pub gateway_addr: SocketAddr,
    pub client: Client,
    context: Arc<ServiceContext>,
    _handles: Vec<JoinHandle<()>>,
}

impl TestServer {
    /// Start both servers over the in-memory store
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start both servers with a custom config
    ///
    /// The config must not name Redis: the shared context already delivers
    /// every change to gateway clients.
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let context = Arc::new(ServiceContext::connect(&config).await?);

        let api = folio_api::create_app(AppState::with_shared(context.clone(), config.clone()));
        let gateway_state = create_gateway_state_with_context(context.clone(), config).await?;
        let gateway = folio_gateway::create_app(gateway_state);

        let (api_addr, api_handle) = serve(api).await?;
        let (gateway_addr, gateway_handle) = serve(gateway).await?;

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            api_addr,
            gateway_addr,
            client,
            context,
            _handles: vec![api_handle, gateway_handle],
        })
    }

    /// Base URL of the REST API
    pub fn base_url(&self) -> String {
        format!("http://{}", self.api_addr)
    }

    /// WebSocket URL of the gateway
    pub fn gateway_url(&self) -> String {
        format!("ws://{}/gateway", self.gateway_addr)
    }

    pub fn context(&self) -> &ServiceContext {
        &self.context
    }

    /// Access token for a member
    pub fn member_token(&self, user_id: i64) -> Result<String> {
        self.token_for(Actor::member(Snowflake::new(user_id)))
    }

    /// Access token for a moderator
    pub fn moderator_token(&self, user_id: i64) -> Result<String> {
        self.token_for(Actor::new(Snowflake::new(user_id), Role::Moderator))
    }

    fn token_for(&self, actor: Actor) -> Result<String> {
        self.context
            .jwt_service()
            .issue_access_token(&actor)
            .map_err(|e| anyhow::anyhow!("Failed to issue token: {e}"))
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a GET request with auth token
    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).bearer_auth(token).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// Make a POST request with auth token
    pub async fn post_auth<T: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    /// Make a PATCH request with auth token
    pub async fn patch_auth<T: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .patch(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    /// Make a DELETE request with auth token
    pub async fn delete_auth(&self, path: &str, token: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.delete(&url).bearer_auth(token).send().await?)
    }

    /// Open a gateway connection and consume its HELLO
    pub async fn connect_gateway(&self) -> Result<GatewayClient> {
        let (stream, _) = connect_async(self.gateway_url()).await?;
        let mut client = GatewayClient { stream };
        let hello = client.next_frame().await?;
        anyhow::ensure!(hello["op"] == 10, "Expected HELLO, got {hello}");
        Ok(client)
    }
}

async fn serve(app: axum::Router) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok((addr, handle))
}

/// Local configuration over the in-memory store
pub fn test_config() -> AppConfig {
    AppConfig::local(TEST_JWT_SECRET)
}

/// A WebSocket client speaking the gateway's JSON frames
pub struct GatewayClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl GatewayClient {
    /// Send one op with its payload
    pub async fn send_op(&mut self, op: u8, d: Value) -> Result<()> {
        let frame = serde_json::json!({ "op": op, "d": d });
        self.stream.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    pub async fn subscribe(&mut self, project_id: i64) -> Result<()> {
        self.send_op(3, serde_json::json!({ "project_id": project_id.to_string() }))
            .await
    }

    pub async fn identify(&mut self, token: &str) -> Result<()> {
        self.send_op(2, serde_json::json!({ "token": token })).await
    }

    /// Next text frame as JSON; fails on close or timeout
    pub async fn next_frame(&mut self) -> Result<Value> {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .context("Timed out waiting for a gateway frame")?
                .context("Gateway stream ended")??;
            match message {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(frame) => anyhow::bail!("Gateway closed: {frame:?}"),
                _ => continue,
            }
        }
    }

    /// Next dispatch whose event type is `event_type`, skipping others
    pub async fn next_dispatch(&mut self, event_type: &str) -> Result<Value> {
        loop {
            let frame = self.next_frame().await?;
            if frame["op"] == 0 && frame["t"] == event_type {
                return Ok(frame);
            }
        }
    }

    /// Wait for the server to close the connection and return its close code
    pub async fn expect_close(&mut self) -> Result<u16> {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .context("Timed out waiting for close")?;
            match message {
                Some(Ok(Message::Close(Some(frame)))) => return Ok(u16::from(frame.code)),
                Some(Ok(Message::Close(None))) | None => {
                    return Ok(u16::from(WsCloseCode::Status))
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => anyhow::bail!("Gateway error before close: {e}"),
            }
        }
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}

/// Assert an error response and return its `error.code`
pub async fn assert_error(response: Response, expected_status: StatusCode) -> Result<String> {
    let body: Value = assert_json(response, expected_status).await?;
    body["error"]["code"]
        .as_str()
        .map(str::to_string)
        .context("Error body has no code")
}
