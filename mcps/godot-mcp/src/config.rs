//! Configuration for the Godot MCP server
//!
//! Config is searched in order:
//! 1. An explicit path (`--config`)
//! 2. `GODOT_MCP_CONFIG` env var
//! 3. `./godot-mcp.toml`
//! 4. `$XDG_CONFIG_HOME/godot-mcp/config.toml`
//! 5. Default config if none found

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use mcp_common::session::{SseConfig, DEFAULT_MAX_BODY_BYTES};
use serde::{Deserialize, Serialize};

use crate::bridge::BridgeConfig;

pub const CONFIG_ENV: &str = "GODOT_MCP_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bridge: BridgeSection,
}

/// `[server]`: the HTTP listener for MCP clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Messages queued per session before `POST /in` waits
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    5050
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_session_buffer() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            session_buffer: default_session_buffer(),
        }
    }
}

/// `[bridge]`: the downstream editor connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSection {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_url() -> String {
    "ws://localhost:9080".to_string()
}

fn default_command_timeout_ms() -> u64 {
    20_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_connect_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            url: default_url(),
            command_timeout_ms: default_command_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            connect_attempts: default_connect_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Config {
    /// Load config, preferring `explicit` when given
    ///
    /// An explicit file (argument or env var) that cannot be read or parsed is
    /// an error. Discovered files that fail to parse are logged and skipped.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            tracing::info!("Loaded config from {}", path.display());
            return Ok(config);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(&env_path);
            let config = Self::from_file(&path)
                .with_context(|| format!("{}={} is not usable", CONFIG_ENV, env_path))?;
            tracing::info!("Loaded config from {}={}", CONFIG_ENV, path.display());
            return Ok(config);
        }

        for path in Self::search_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    return Ok(config);
                }
                Err(e) => {
                    tracing::warn!("Skipping config {}: {:#}", path.display(), e);
                }
            }
        }

        tracing::info!("Using default configuration");
        Ok(Self::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("godot-mcp.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("godot-mcp").join("config.toml"));
        }
        paths
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    pub fn sse_config(&self) -> SseConfig {
        SseConfig {
            bind: self.bind_addr(),
            max_body_bytes: self.server.max_body_bytes,
            session_buffer: self.server.session_buffer.max(1),
            ..SseConfig::default()
        }
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            url: self.bridge.url.clone(),
            command_timeout: Duration::from_millis(self.bridge.command_timeout_ms),
            connect_timeout: Duration::from_millis(self.bridge.connect_timeout_ms),
            connect_attempts: self.bridge.connect_attempts.max(1),
            retry_delay: Duration::from_millis(self.bridge.retry_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), SocketAddr::from(([127, 0, 0, 1], 5050)));
        assert_eq!(config.server.max_body_bytes, 8 * 1024 * 1024);

        let bridge = config.bridge_config();
        assert_eq!(bridge.url, "ws://localhost:9080");
        assert_eq!(bridge.command_timeout, Duration::from_secs(20));
        assert_eq!(bridge.connect_attempts, 1);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 6060

[bridge]
url = "ws://127.0.0.1:9999"
connect_attempts = 3
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 6060);
        assert_eq!(config.server.host, default_host());
        assert_eq!(config.bridge.url, "ws://127.0.0.1:9999");
        assert_eq!(config.bridge.connect_attempts, 3);
        assert_eq!(config.bridge.command_timeout_ms, 20_000);
    }

    #[test]
    fn test_explicit_unparsable_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a number\"").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_zero_attempts_still_dials_once() {
        let mut config = Config::default();
        config.bridge.connect_attempts = 0;
        config.server.session_buffer = 0;
        assert_eq!(config.bridge_config().connect_attempts, 1);
        assert_eq!(config.sse_config().session_buffer, 1);
    }
}
