//! Gremlin request and response bodies.
//!
//! The HTTP endpoint takes a bare `{"gremlin": ...}` body. The driver protocol
//! wraps a GraphSON v2 request message in a binary frame: one length byte, the
//! mime type, then the JSON. Both return the same response envelope.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Serializer negotiated with the server on every driver frame.
pub const GRAPHSON_V2_MIME: &str = "application/vnd.gremlin-v2.0+json";

/// Response codes of the driver protocol.
pub mod status {
    pub const SUCCESS: u16 = 200;
    pub const NO_CONTENT: u16 = 204;
    pub const PARTIAL_CONTENT: u16 = 206;
    pub const AUTHENTICATE: u16 = 407;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GremlinRequest<'a> {
    pub gremlin: &'a str,
}

impl<'a> GremlinRequest<'a> {
    pub fn new(gremlin: &'a str) -> Self {
        Self { gremlin }
    }
}

/// GraphSON v2 typed UUID, `{"@type": "g:UUID", "@value": "..."}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypedUuid {
    #[serde(rename = "@type")]
    type_tag: &'static str,
    #[serde(rename = "@value")]
    value: Uuid,
}

impl From<Uuid> for TypedUuid {
    fn from(value: Uuid) -> Self {
        Self {
            type_tag: "g:UUID",
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DriverArgs<'a> {
    Eval { gremlin: &'a str },
    Authentication { sasl: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRequest<'a> {
    pub request_id: TypedUuid,
    pub op: &'static str,
    pub processor: &'static str,
    pub args: DriverArgs<'a>,
}

impl<'a> DriverRequest<'a> {
    pub fn eval(request_id: Uuid, gremlin: &'a str) -> Self {
        Self {
            request_id: request_id.into(),
            op: "eval",
            processor: "",
            args: DriverArgs::Eval { gremlin },
        }
    }

    /// Answer to a `407` challenge for `request_id`.
    pub fn authentication(request_id: Uuid, username: &str, password: &str) -> Self {
        Self {
            request_id: request_id.into(),
            op: "authentication",
            processor: "",
            args: DriverArgs::Authentication {
                sasl: sasl_plain(username, password),
            },
        }
    }

    /// `[mime length][mime][json]`, ready for a binary WebSocket message.
    pub fn to_frame(&self) -> Result<Vec<u8>, serde_json::Error> {
        let body = serde_json::to_vec(self)?;
        let mut frame = Vec::with_capacity(1 + GRAPHSON_V2_MIME.len() + body.len());
        frame.push(GRAPHSON_V2_MIME.len() as u8);
        frame.extend_from_slice(GRAPHSON_V2_MIME.as_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

/// SASL PLAIN initial response: base64 of `\0username\0password`.
pub fn sasl_plain(username: &str, password: &str) -> String {
    BASE64.encode(format!("\0{username}\0{password}"))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GremlinResponse {
    #[serde(default)]
    pub request_id: Option<String>,
    pub status: GremlinStatus,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GremlinStatus {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}
