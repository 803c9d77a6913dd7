//! Error handling utilities for MCP servers
//!
//! Provides traits and helpers for consistent error handling across MCP servers.

use rmcp::ErrorData as McpError;

/// Trait for converting errors into MCP-compatible errors
///
/// Implement this for a server's own error type to use `?` with
/// [`ResultExt::to_mcp_err`] in handlers.
///
/// ```rust,ignore
/// impl IntoMcpError for BridgeError {
///     fn into_mcp_error(self) -> McpError {
///         McpError::internal_error(self.to_string(), None)
///     }
/// }
/// ```
pub trait IntoMcpError {
    /// Convert this error into an MCP error
    fn into_mcp_error(self) -> McpError;
}

impl IntoMcpError for serde_json::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(format!("JSON error: {}", self), None)
    }
}

/// Extension trait for Result types to convert to MCP errors
///
/// ```rust,ignore
/// let text = serde_json::to_string(&value).to_mcp_err()?;
/// ```
pub trait ResultExt<T> {
    /// Convert the error to an MCP error
    fn to_mcp_err(self) -> Result<T, McpError>;
}

impl<T, E: IntoMcpError> ResultExt<T> for Result<T, E> {
    fn to_mcp_err(self) -> Result<T, McpError> {
        self.map_err(|e| e.into_mcp_error())
    }
}

/// Create a resource-not-found error for an unknown resource URI
pub fn resource_not_found(uri: &str) -> McpError {
    McpError::resource_not_found(format!("Resource not found: {}", uri), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ext_json() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err = result.to_mcp_err().unwrap_err();
        assert!(err.message.starts_with("JSON error"));
    }

    #[test]
    fn test_resource_not_found_mentions_uri() {
        let err = resource_not_found("godot/unknown");
        assert!(err.message.contains("godot/unknown"));
    }
}
