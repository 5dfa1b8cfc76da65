//! Gremlin execution channels.
//!
//! - [`websocket`]: the Gremlin driver protocol over `ws(s)://host:port/gremlin`,
//!   GraphSON v2 frames, SASL PLAIN on a `407` challenge. This is what Azure
//!   Cosmos DB's Gremlin API and Gremlin Server both speak.
//! - [`http`]: Gremlin Server's HTTP endpoint, one `POST /` with
//!   `{"gremlin": "<traversal>"}` per statement and basic auth. Cosmos DB does
//!   not serve this endpoint.
//!
//! Cosmos DB credentials are username `/dbs/<database>/colls/<collection>` and
//! the account key as password; both transports carry them unchanged.

pub mod http;
pub mod protocol;
pub mod websocket;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use sociogram_core::ChannelError;

pub use http::{GremlinHttpChannel, GremlinHttpConnector};
pub use websocket::{GremlinWsChannel, GremlinWsConnector};

/// Which wire protocol `load` uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    WebSocket,
    Http,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WebSocket => "websocket",
            Self::Http => "http",
        })
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(Self::WebSocket),
            "http" => Ok(Self::Http),
            other => Err(format!(
                "unknown transport `{other}` (expected `websocket` or `http`)"
            )),
        }
    }
}

/// Where the Gremlin endpoint lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GremlinServer {
    pub hostname: String,
    pub port: u16,
    pub enable_ssl: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl GremlinServer {
    pub fn new(hostname: impl Into<String>, port: u16, enable_ssl: bool) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            enable_ssl,
            username: None,
            password: None,
            timeout: None,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// HTTP endpoint, `http(s)://host:port/`.
    pub fn endpoint(&self) -> Result<Url, ChannelError> {
        let scheme = if self.enable_ssl { "https" } else { "http" };
        self.url(scheme, "/")
    }

    /// Driver endpoint, `ws(s)://host:port/gremlin`.
    pub fn websocket_endpoint(&self) -> Result<Url, ChannelError> {
        let scheme = if self.enable_ssl { "wss" } else { "ws" };
        self.url(scheme, "/gremlin")
    }

    fn url(&self, scheme: &str, path: &str) -> Result<Url, ChannelError> {
        let raw = format!("{scheme}://{}:{}{path}", self.hostname.trim(), self.port);
        Url::parse(&raw)
            .map_err(|e| ChannelError::Transport(format!("invalid endpoint `{raw}`: {e}")))
    }

    fn credentials(&self) -> Option<(String, String)> {
        self.username
            .clone()
            .map(|user| (user, self.password.clone().unwrap_or_default()))
    }
}

/// Cosmos DB graph resource path, used as the username.
pub fn cosmos_username(database: &str, collection: &str) -> String {
    format!("/dbs/{database}/colls/{collection}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_follow_tls_flag() {
        let tls = GremlinServer::new("example.gremlin.cosmos.azure.com", 443, true);
        assert_eq!(
            tls.endpoint().unwrap().as_str(),
            "https://example.gremlin.cosmos.azure.com/"
        );
        assert_eq!(
            tls.websocket_endpoint().unwrap().as_str(),
            "wss://example.gremlin.cosmos.azure.com/gremlin"
        );

        let plain = GremlinServer::new("localhost", 8182, false);
        assert_eq!(plain.endpoint().unwrap().as_str(), "http://localhost:8182/");
        assert_eq!(
            plain.websocket_endpoint().unwrap().as_str(),
            "ws://localhost:8182/gremlin"
        );
    }

    #[test]
    fn bad_hostname_is_a_transport_error() {
        let server = GremlinServer::new("bad host", 8182, false);
        assert!(matches!(server.endpoint(), Err(ChannelError::Transport(_))));
        assert!(matches!(
            server.websocket_endpoint(),
            Err(ChannelError::Transport(_))
        ));
    }

    #[test]
    fn cosmos_username_layout() {
        assert_eq!(cosmos_username("db", "graph"), "/dbs/db/colls/graph");
    }

    #[test]
    fn transport_names() {
        assert_eq!(Transport::default(), Transport::WebSocket);
        assert_eq!("http".parse::<Transport>(), Ok(Transport::Http));
        assert_eq!("WebSocket".parse::<Transport>(), Ok(Transport::WebSocket));
        assert!("grpc".parse::<Transport>().is_err());
        assert_eq!(
            serde_json::to_value(Transport::WebSocket).unwrap(),
            serde_json::json!("websocket")
        );
        assert_eq!(Transport::Http.to_string(), "http");
    }
}
