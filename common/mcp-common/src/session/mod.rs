//! Multi-client session transport
//!
//! Serves many concurrent MCP sessions from one process over two HTTP routes:
//!
//! - `GET /out` opens a server-sent-event stream. A new session is registered
//!   and its first event (`endpoint`) carries the URL to post messages to.
//! - `POST /in` delivers one JSON message to the session named by the
//!   `X-Session-Id` header or the `sessionId` query parameter.
//!
//! Closing the event stream tears the session down; later posts for the same
//! id fail with 404.

mod error;
mod registry;
mod service;
mod sse;

pub use error::TransportError;
pub use registry::{Session, SessionId, SessionRegistry};
pub use service::{McpSessions, SessionChannels, SessionService};
pub use sse::{
    SessionStream, SseConfig, SseMultiplexer, DEFAULT_MAX_BODY_BYTES, IN_PATH, OUT_PATH,
    SESSION_ID_HEADER, SESSION_ID_QUERY,
};
