//! Gremlin driver protocol over WebSocket.
//!
//! One connection per run, one request in flight. Each statement is an
//! `eval` request; the server answers with one or more response frames
//! (`206` while more follow, then `200`/`204`). A `407` asks the client to
//! authenticate the pending request with SASL PLAIN.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;
use uuid::Uuid;

use sociogram_core::{ChannelConnector, ChannelError, ExecutionChannel};

use crate::protocol::{status, DriverRequest, GremlinResponse};
use crate::GremlinServer;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct GremlinWsConnector {
    server: GremlinServer,
}

impl GremlinWsConnector {
    pub fn new(server: GremlinServer) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &GremlinServer {
        &self.server
    }
}

#[async_trait]
impl ChannelConnector for GremlinWsConnector {
    type Channel = GremlinWsChannel;

    async fn open(&self) -> Result<Self::Channel, ChannelError> {
        GremlinWsChannel::open(&self.server).await
    }
}

pub struct GremlinWsChannel {
    stream: Option<WsStream>,
    endpoint: Url,
    credentials: Option<(String, String)>,
    timeout: Option<Duration>,
    submitted: usize,
}

impl GremlinWsChannel {
    /// Connect and complete the WebSocket handshake.
    pub async fn open(server: &GremlinServer) -> Result<Self, ChannelError> {
        let endpoint = server.websocket_endpoint()?;
        let connect = async {
            connect_async(endpoint.as_str())
                .await
                .map(|(stream, _response)| stream)
                .map_err(|e| {
                    ChannelError::Transport(format!("failed to connect to {endpoint}: {e}"))
                })
        };
        let stream = within(server.timeout, "connect", connect).await?;

        tracing::info!(endpoint = %endpoint, "opened gremlin websocket channel");
        Ok(Self {
            stream: Some(stream),
            endpoint,
            credentials: server.credentials(),
            timeout: server.timeout,
            submitted: 0,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

#[async_trait]
impl ExecutionChannel for GremlinWsChannel {
    async fn submit(&mut self, statement: &str) -> Result<(), ChannelError> {
        let stream = self.stream.as_mut().ok_or(ChannelError::Closed)?;

        self.submitted += 1;
        tracing::debug!(endpoint = %self.endpoint, %statement, "gremlin submit");

        let credentials = self.credentials.as_ref();
        within(
            self.timeout,
            "request",
            exchange(stream, statement, credentials),
        )
        .await
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        tracing::info!(
            endpoint = %self.endpoint,
            submitted = self.submitted,
            "closed gremlin websocket channel"
        );
        stream
            .close(None)
            .await
            .map_err(|e| ChannelError::Transport(format!("failed to close websocket: {e}")))
    }
}

/// Send one `eval` and read frames until its terminal status.
async fn exchange(
    stream: &mut WsStream,
    statement: &str,
    credentials: Option<&(String, String)>,
) -> Result<(), ChannelError> {
    let request_id = Uuid::new_v4();
    send(stream, &DriverRequest::eval(request_id, statement)).await?;

    let mut authenticated = false;
    loop {
        let response = receive(stream).await?;
        match response.status.code {
            status::SUCCESS | status::NO_CONTENT => return Ok(()),
            status::PARTIAL_CONTENT => continue,
            status::AUTHENTICATE => {
                let Some((username, password)) = credentials else {
                    return Err(ChannelError::Rejected {
                        status: status::AUTHENTICATE,
                        message: "server requires authentication but no auth key is configured"
                            .to_string(),
                    });
                };
                if authenticated {
                    return Err(ChannelError::Rejected {
                        status: status::AUTHENTICATE,
                        message: response.status.message,
                    });
                }
                authenticated = true;
                tracing::debug!(%request_id, "answering sasl challenge");
                send(
                    stream,
                    &DriverRequest::authentication(request_id, username, password),
                )
                .await?;
            }
            code => {
                return Err(ChannelError::Rejected {
                    status: code,
                    message: response.status.message,
                })
            }
        }
    }
}

async fn send(stream: &mut WsStream, request: &DriverRequest<'_>) -> Result<(), ChannelError> {
    let frame = request
        .to_frame()
        .map_err(|e| ChannelError::Transport(format!("failed to encode request: {e}")))?;
    stream
        .send(Message::Binary(frame.into()))
        .await
        .map_err(|e| ChannelError::Transport(format!("websocket send failed: {e}")))
}

/// Next response envelope; control frames are skipped.
async fn receive(stream: &mut WsStream) -> Result<GremlinResponse, ChannelError> {
    loop {
        let message = stream
            .next()
            .await
            .ok_or_else(|| ChannelError::Transport("connection closed by server".to_string()))?
            .map_err(|e| ChannelError::Transport(format!("websocket receive failed: {e}")))?;

        let body: &[u8] = match &message {
            Message::Text(text) => text.as_bytes(),
            Message::Binary(data) => &data[..],
            Message::Close(_) => {
                return Err(ChannelError::Transport(
                    "connection closed by server".to_string(),
                ))
            }
            _ => continue,
        };
        return serde_json::from_slice(body)
            .map_err(|e| ChannelError::InvalidResponse(format!("malformed gremlin response: {e}")));
    }
}

async fn within<T, F>(limit: Option<Duration>, what: &str, future: F) -> Result<T, ChannelError>
where
    F: Future<Output = Result<T, ChannelError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, future).await.map_err(|_| {
            ChannelError::Transport(format!("gremlin {what} timed out after {limit:?}"))
        })?,
        None => future.await,
    }
}
