//! MCP Common - Shared utilities for MCP servers
//!
//! This crate provides common functionality used across MCP servers:
//!
//! - **Initialization**: [`init_tracing`] and [`serve_stdio`] for standardized startup
//! - **Sessions**: an HTTP/SSE multiplexer that serves many concurrent MCP sessions
//!   from one process (see [`session`])
//! - **Results**: Helper functions for creating `CallToolResult` responses
//! - **Errors**: Traits for converting errors to MCP-compatible format
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mcp_common::session::{McpSessions, SseConfig, SseMultiplexer};
//!
//! let mux = Arc::new(SseMultiplexer::new(McpSessions::new(MyServer::new()), SseConfig::default()));
//! let listener = tokio::net::TcpListener::bind(mux.config().bind).await?;
//! mux.serve(listener, async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

pub mod error;
pub mod init;
pub mod result;
pub mod session;

// Re-export commonly used items at crate root
pub use error::{resource_not_found, IntoMcpError, ResultExt};
pub use init::{init_tracing, serve_stdio};
pub use result::{error_text, json_success, text_success};

// Re-export rmcp types that are commonly needed
pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};
