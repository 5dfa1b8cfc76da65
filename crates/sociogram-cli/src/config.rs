//! Run configuration: defaults → JSON file → environment → CLI flags.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sociogram_gremlin::{cosmos_username, GremlinServer, Transport};

pub const AUTH_KEY_ENV: &str = "SOCIOGRAM_AUTH_KEY";

pub const DEFAULT_NAMES: [&str; 21] = [
    "Hazel", "Madeline", "Isaac", "Shelia", "Christy", "Thelma", "Kara", "Johnnie", "Ron",
    "Frances", "Eddie", "Mona", "Jose", "Santos", "Joyce", "Jim", "Shannon", "Ralph", "Benjamin",
    "Estelle", "Celia",
];

/// Connection settings for the graph endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `websocket` (Cosmos DB and Gremlin Server) or `http` (Gremlin Server only).
    pub transport: Transport,
    pub hostname: String,
    pub port: u16,
    pub enable_ssl: bool,
    /// Cosmos DB primary key, sent as the password. Prefer the environment.
    pub auth_key: Option<String>,
    pub database: String,
    pub collection: String,
    pub timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::WebSocket,
            hostname: "localhost".to_string(),
            port: 443,
            enable_ssl: true,
            auth_key: None,
            database: "sociogram".to_string(),
            collection: "people".to_string(),
            timeout_secs: None,
        }
    }
}

impl ServerConfig {
    pub fn to_gremlin_server(&self) -> GremlinServer {
        let mut server = GremlinServer::new(self.hostname.clone(), self.port, self.enable_ssl)
            .with_timeout(self.timeout_secs.map(Duration::from_secs));
        if let Some(key) = &self.auth_key {
            server = server.with_credentials(cosmos_username(&self.database, &self.collection), key);
        }
        server
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SociogramConfig {
    pub server: ServerConfig,
    pub names: Vec<String>,
}

impl Default for SociogramConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            names: DEFAULT_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl SociogramConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    /// Load `path` when given, otherwise start from defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_auth_key(std::env::var(AUTH_KEY_ENV).ok());
    }

    fn apply_auth_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.server.auth_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.hostname.trim().is_empty() {
            return Err(anyhow!("hostname must not be empty"));
        }
        validate_names(&self.names)
    }
}

/// At least one name, none empty, no duplicates.
pub fn validate_names(names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(anyhow!("at least one name is required"));
    }
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(anyhow!("names must not be empty"));
        }
        if !seen.insert(name.as_str()) {
            return Err(anyhow!("duplicate name `{name}`"));
        }
    }
    Ok(())
}

/// One name per line; blank lines and `#` comments are skipped.
pub fn parse_names(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_names_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read names file {}", path.display()))?;
    Ok(parse_names(&contents))
}
