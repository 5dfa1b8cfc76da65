//! Gremlin Server HTTP endpoint: one `POST /` per statement.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use sociogram_core::{ChannelConnector, ChannelError, ExecutionChannel};

use crate::protocol::{GremlinRequest, GremlinResponse};
use crate::GremlinServer;

#[derive(Debug, Clone)]
pub struct GremlinHttpConnector {
    server: GremlinServer,
}

impl GremlinHttpConnector {
    pub fn new(server: GremlinServer) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &GremlinServer {
        &self.server
    }
}

#[async_trait]
impl ChannelConnector for GremlinHttpConnector {
    type Channel = GremlinHttpChannel;

    async fn open(&self) -> Result<Self::Channel, ChannelError> {
        GremlinHttpChannel::open(&self.server)
    }
}

/// One HTTP client bound to one endpoint for the duration of a run.
#[derive(Debug)]
pub struct GremlinHttpChannel {
    client: Option<Client>,
    endpoint: Url,
    credentials: Option<(String, String)>,
    submitted: usize,
}

impl GremlinHttpChannel {
    pub fn open(server: &GremlinServer) -> Result<Self, ChannelError> {
        let endpoint = server.endpoint()?;
        let mut builder = Client::builder();
        if let Some(timeout) = server.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChannelError::Transport(format!("failed to build http client: {e}")))?;

        tracing::info!(endpoint = %endpoint, "opened gremlin http channel");
        Ok(Self {
            client: Some(client),
            endpoint,
            credentials: server.credentials(),
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
impl ExecutionChannel for GremlinHttpChannel {
    async fn submit(&mut self, statement: &str) -> Result<(), ChannelError> {
        let client = self.client.as_ref().ok_or(ChannelError::Closed)?;

        let mut request = client
            .post(self.endpoint.clone())
            .json(&GremlinRequest::new(statement));
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        self.submitted += 1;
        tracing::debug!(endpoint = %self.endpoint, %statement, "gremlin submit");

        let response = request.send().await.map_err(|e| {
            ChannelError::Transport(format!("failed to reach {}: {e}", self.endpoint))
        })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChannelError::Transport(format!("failed to read response: {e}")))?;

        interpret_response(status, &body)
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if self.client.take().is_some() {
            tracing::info!(
                endpoint = %self.endpoint,
                submitted = self.submitted,
                "closed gremlin http channel"
            );
        }
        Ok(())
    }
}

/// Map an HTTP status + body onto the channel contract.
///
/// A non-2xx HTTP status, or a 2xx whose Gremlin status code is not 2xx, is a
/// rejection. A 2xx body that is not a Gremlin response is accepted as-is.
fn interpret_response(status: StatusCode, body: &str) -> Result<(), ChannelError> {
    let parsed = serde_json::from_str::<GremlinResponse>(body).ok();

    if !status.is_success() {
        let message = parsed
            .map(|r| r.status.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| body.trim().to_string());
        return Err(ChannelError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    match parsed {
        Some(r) if !StatusCode::from_u16(r.status.code).is_ok_and(|c| c.is_success()) => {
            Err(ChannelError::Rejected {
                status: r.status.code,
                message: r.status.message,
            })
        }
        _ => Ok(()),
    }
}
