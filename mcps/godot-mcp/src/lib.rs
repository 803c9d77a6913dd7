//! Godot MCP - bridges MCP clients to a running Godot editor
//!
//! Many MCP sessions (served over HTTP/SSE by `mcp_common::session`, or one
//! session over stdio) share a single WebSocket connection to the editor
//! plugin. The [`bridge`] correlates each command with its response, so
//! concurrent callers never see each other's results.

pub mod bridge;
pub mod config;
mod handlers;
pub mod params;
pub mod resources;
pub mod server;
pub mod types;

pub use bridge::{BridgeConfig, BridgeError, CommandBridge, ConnectionState};
pub use config::Config;
pub use server::GodotMcpServer;
