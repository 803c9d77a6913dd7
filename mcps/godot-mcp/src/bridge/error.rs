//! Command bridge errors

use mcp_common::{IntoMcpError, McpError};

/// Why a `send_command` call failed
///
/// Only [`BridgeError::ConnectionLost`] is ever seen by more than one caller:
/// it is broadcast to every call pending when the link drops.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The downstream connection could not be established
    #[error("Could not connect to Godot at {url}: {reason}")]
    Connection { url: String, reason: String },

    /// The connection dropped while the call was outstanding
    #[error("Connection to Godot lost before a response arrived")]
    ConnectionLost,

    /// No response arrived within the call's bound
    #[error("Command '{command}' timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },

    /// Godot answered the request with `success: false`
    #[error("{message}")]
    RemoteCommand { command: String, message: String },

    /// A frame could not be encoded or decoded
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl IntoMcpError for BridgeError {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(self.to_string(), None)
    }
}
