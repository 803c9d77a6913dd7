//! Protocol side of a session

use futures::channel::mpsc::UnboundedSender;
use rmcp::{
    model::{ClientJsonRpcMessage, ServerJsonRpcMessage},
    ServerHandler, ServiceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::SessionId;

/// Queues wired to one freshly subscribed session
pub struct SessionChannels<I, O> {
    pub id: SessionId,
    /// Messages posted for this session, in arrival order
    pub inbound: mpsc::Receiver<I>,
    /// Messages to push down the session's event stream
    pub outbound: UnboundedSender<O>,
}

/// Something that can run the protocol for a session
///
/// The multiplexer calls [`attach`](SessionService::attach) once per
/// subscription. The service is expected to spawn whatever drives the session
/// and return immediately; it ends by dropping `outbound`, and learns about
/// disconnects when `inbound` closes.
pub trait SessionService: Send + Sync + 'static {
    type Inbound: DeserializeOwned + Send + 'static;
    type Outbound: Serialize + Send + 'static;

    fn attach(&self, channels: SessionChannels<Self::Inbound, Self::Outbound>);
}

/// Runs an rmcp server handler for every session
///
/// Each session gets its own clone of the handler, so handlers share state
/// only through what they hold behind `Arc`.
#[derive(Clone)]
pub struct McpSessions<S> {
    handler: S,
}

impl<S> McpSessions<S>
where
    S: ServerHandler + Clone,
{
    pub fn new(handler: S) -> Self {
        Self { handler }
    }
}

impl<S> SessionService for McpSessions<S>
where
    S: ServerHandler + Clone,
{
    type Inbound = ClientJsonRpcMessage;
    type Outbound = ServerJsonRpcMessage;

    fn attach(&self, channels: SessionChannels<Self::Inbound, Self::Outbound>) {
        let handler = self.handler.clone();
        let SessionChannels {
            id,
            inbound,
            outbound,
        } = channels;

        tokio::spawn(async move {
            let transport = (outbound, ReceiverStream::new(inbound));
            match handler.serve(transport).await {
                Ok(service) => match service.waiting().await {
                    Ok(reason) => tracing::debug!(session = %id, "MCP session ended: {:?}", reason),
                    Err(e) => tracing::warn!(session = %id, "MCP session task failed: {}", e),
                },
                Err(e) => {
                    tracing::warn!(session = %id, "MCP session failed to initialize: {}", e);
                }
            }
        });
    }
}
