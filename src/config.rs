//! Connection configuration for the metadata store.
//!
//! Loaded from environment variables or a YAML file. Missing values take the
//! defaults below.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{RegistryError, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
/// Per-call deadline applied to every RPC.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

pub const HOST_ENV: &str = "MLMD_HOST";
pub const PORT_ENV: &str = "MLMD_PORT";
pub const TIMEOUT_ENV: &str = "MLMD_TIMEOUT_MS";
pub const CONNECT_TIMEOUT_ENV: &str = "MLMD_CONNECT_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl RegistryConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Build from `MLMD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Config(format!("Reading {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
            .map_err(|e| RegistryError::Config(format!("Parsing {}: {}", path.display(), e)))
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a struct
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_ENV).filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV) {
            config.port = parse_var(PORT_ENV, &port)?;
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            config.timeout_ms = parse_var(TIMEOUT_ENV, &timeout)?;
        }
        if let Some(timeout) = lookup(CONNECT_TIMEOUT_ENV) {
            config.connect_timeout_ms = parse_var(CONNECT_TIMEOUT_ENV, &timeout)?;
        }

        Ok(config)
    }

    /// Endpoint URI for the gRPC channel.
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| RegistryError::Config(format!("{}='{}': {}", key, raw, e)))
}
