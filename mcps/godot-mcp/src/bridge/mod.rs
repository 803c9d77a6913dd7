//! Command bridge to the Godot editor
//!
//! One logical connection to the editor plugin, shared by every MCP session.
//! Callers use [`CommandBridge::send_command`]; the bridge correlates each
//! response to its request by id, so responses may arrive in any order.
//!
//! Reconnection is lazy: when the link drops, every pending call fails with
//! [`BridgeError::ConnectionLost`] and the next `send_command` dials again.

mod error;
mod link;
mod pending;
mod protocol;

#[cfg(test)]
pub(crate) mod testing;

pub use error::BridgeError;
pub use link::{Connector, FrameSink, FrameStream, Link, WebSocketConnector};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::AbortHandle;

use pending::{PendingCalls, PendingGuard};

/// Default bound on a single command round trip
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(20);

/// Settings for [`CommandBridge`]
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub url: String,
    pub command_timeout: Duration,
    /// Bound on a single dial
    pub connect_timeout: Duration,
    /// Dials per `connect()`; 1 means no retry
    pub connect_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:9080".to_string(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            connect_timeout: Duration::from_secs(5),
            connect_attempts: 1,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Snapshot of the downstream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Cheaply cloneable handle to the single downstream connection
#[derive(Clone)]
pub struct CommandBridge {
    inner: Arc<Inner>,
}

struct Inner {
    connector: Box<dyn Connector>,
    config: BridgeConfig,
    state: Mutex<LinkState>,
    /// Serializes connect/disconnect so only one dial is in flight
    transition: tokio::sync::Mutex<()>,
    pending: PendingCalls,
    generation: AtomicU64,
    dropped_frames: AtomicU64,
}

enum LinkState {
    Disconnected,
    Connecting,
    Connected(Arc<ActiveLink>),
}

struct ActiveLink {
    generation: u64,
    sink: tokio::sync::Mutex<FrameSink>,
    reader: AbortHandle,
}

impl ActiveLink {
    async fn send(&self, frame: String) -> anyhow::Result<()> {
        self.sink.lock().await.send(frame).await
    }
}

impl CommandBridge {
    pub fn new(connector: impl Connector, config: BridgeConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector: Box::new(connector),
                config,
                state: Mutex::new(LinkState::Disconnected),
                transition: tokio::sync::Mutex::new(()),
                pending: PendingCalls::new(),
                generation: AtomicU64::new(0),
                dropped_frames: AtomicU64::new(0),
            }),
        }
    }

    /// Bridge that dials the editor's WebSocket at `config.url`
    pub fn websocket(config: BridgeConfig) -> Self {
        let connector = WebSocketConnector::new(config.url.clone());
        Self::new(connector, config)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn endpoint(&self) -> &str {
        self.inner.connector.endpoint()
    }

    pub fn state(&self) -> ConnectionState {
        match &*self.inner.state.lock() {
            LinkState::Disconnected => ConnectionState::Disconnected,
            LinkState::Connecting => ConnectionState::Connecting,
            LinkState::Connected(_) => ConnectionState::Connected,
        }
    }

    /// Number of commands awaiting a response
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Response frames discarded because no pending call matched them
    pub fn dropped_frames(&self) -> u64 {
        self.inner.dropped_frames.load(Ordering::Relaxed)
    }

    /// Establish the downstream connection; a no-op when already connected
    pub async fn connect(&self) -> Result<(), BridgeError> {
        let _transition = self.inner.transition.lock().await;
        if self.inner.current_link().is_some() {
            return Ok(());
        }

        *self.inner.state.lock() = LinkState::Connecting;
        let link = match self.inner.dial().await {
            Ok(link) => link,
            Err(e) => {
                *self.inner.state.lock() = LinkState::Disconnected;
                return Err(e);
            }
        };

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let Link { sink, stream } = link;
        {
            // Hold the state lock across the spawn so the reader cannot report
            // a close before this link is installed.
            let mut state = self.inner.state.lock();
            let reader = tokio::spawn(read_frames(
                Arc::downgrade(&self.inner),
                generation,
                stream,
            ));
            *state = LinkState::Connected(Arc::new(ActiveLink {
                generation,
                sink: tokio::sync::Mutex::new(sink),
                reader: reader.abort_handle(),
            }));
        }

        tracing::info!("Connected to Godot at {}", self.endpoint());
        Ok(())
    }

    /// Close the downstream connection; idempotent
    ///
    /// Calls still pending fail with [`BridgeError::ConnectionLost`].
    pub async fn disconnect(&self) {
        let _transition = self.inner.transition.lock().await;
        let previous = std::mem::replace(&mut *self.inner.state.lock(), LinkState::Disconnected);
        let LinkState::Connected(link) = previous else {
            return;
        };

        link.reader.abort();
        if let Err(e) = link.sink.lock().await.close().await {
            tracing::debug!("Error closing Godot connection: {:#}", e);
        }
        let failed = self.inner.pending.fail_all(|| BridgeError::ConnectionLost);
        tracing::info!(
            "Disconnected from Godot ({} pending command(s) failed)",
            failed
        );
    }

    /// Send a command with the configured timeout and wait for its result
    pub async fn send_command(&self, command: &str, params: Value) -> Result<Value, BridgeError> {
        self.send_command_with_timeout(command, params, self.inner.config.command_timeout)
            .await
    }

    /// Send a command and wait at most `timeout` for its result
    ///
    /// Connects first when no link is up. Safe to call from any number of
    /// tasks at once; each call resolves only from the response carrying its
    /// own correlation id.
    pub async fn send_command_with_timeout(
        &self,
        command: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, BridgeError> {
        let link = match self.inner.current_link() {
            Some(link) => link,
            None => {
                self.connect().await?;
                self.inner
                    .current_link()
                    .ok_or(BridgeError::ConnectionLost)?
            }
        };

        let (id, slot) = self.inner.pending.register(command);
        let _guard = PendingGuard {
            calls: &self.inner.pending,
            id: &id,
        };

        // The link may have closed between the snapshot and registration; after
        // this check any close is guaranteed to fail our entry.
        if !self.inner.is_current(link.generation) {
            return Err(BridgeError::ConnectionLost);
        }

        let frame = protocol::encode_request(&id, command, &params)
            .map_err(|e| BridgeError::Protocol(e.to_string()))?;

        tracing::debug!("Sending command '{}' as {}", command, id);
        if let Err(e) = link.send(frame).await {
            tracing::warn!("Failed to send command '{}': {:#}", command, e);
            self.inner.link_closed(link.generation);
            return Err(BridgeError::ConnectionLost);
        }

        match tokio::time::timeout(timeout, slot).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(BridgeError::ConnectionLost),
            Err(_) => {
                tracing::warn!("Command '{}' ({}) timed out after {:?}", command, id, timeout);
                Err(BridgeError::Timeout {
                    command: command.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

impl Inner {
    fn current_link(&self) -> Option<Arc<ActiveLink>> {
        match &*self.state.lock() {
            LinkState::Connected(link) => Some(link.clone()),
            _ => None,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        matches!(&*self.state.lock(), LinkState::Connected(link) if link.generation == generation)
    }

    /// Dial with the configured attempts, delay and per-dial timeout
    async fn dial(&self) -> Result<Link, BridgeError> {
        let attempts = self.config.connect_attempts.max(1);
        let mut reason = String::new();

        for attempt in 1..=attempts {
            match tokio::time::timeout(self.config.connect_timeout, self.connector.connect()).await
            {
                Ok(Ok(link)) => return Ok(link),
                Ok(Err(e)) => reason = format!("{:#}", e),
                Err(_) => {
                    reason = format!("timed out after {:?}", self.config.connect_timeout)
                }
            }
            tracing::debug!(
                "Connection attempt {}/{} to {} failed: {}",
                attempt,
                attempts,
                self.connector.endpoint(),
                reason
            );
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(BridgeError::Connection {
            url: self.connector.endpoint().to_string(),
            reason,
        })
    }

    /// Route one response frame to the call waiting for it
    fn handle_frame(&self, text: &str) {
        match protocol::decode_response(text) {
            Ok(response) => match self.pending.take(&response.id) {
                Some(call) => {
                    let outcome = response.outcome.map_err(|message| BridgeError::RemoteCommand {
                        command: call.command().to_string(),
                        message,
                    });
                    call.fulfil(outcome);
                }
                None => self.drop_frame(&format!("no pending call with id {}", response.id)),
            },
            Err(err) => match err.id.as_deref().and_then(|id| self.pending.take(id)) {
                Some(call) => call.fulfil(Err(BridgeError::Protocol(err.reason))),
                None => self.drop_frame(&err.reason),
            },
        }
    }

    fn drop_frame(&self, reason: &str) {
        self.dropped_frames.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("Dropped response frame from Godot: {}", reason);
    }

    /// Tear down link `generation` if it is still the live one
    fn link_closed(&self, generation: u64) {
        // Fail pending calls under the state lock so none registered against a
        // newer link can be swept up.
        let mut state = self.state.lock();
        let is_current =
            matches!(&*state, LinkState::Connected(link) if link.generation == generation);
        if !is_current {
            return;
        }
        *state = LinkState::Disconnected;
        let failed = self.pending.fail_all(|| BridgeError::ConnectionLost);
        drop(state);

        tracing::warn!(
            "Connection to Godot closed; {} pending command(s) failed",
            failed
        );
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let LinkState::Connected(link) = &*self.state.lock() {
            link.reader.abort();
        }
    }
}

async fn read_frames(inner: Weak<Inner>, generation: u64, mut stream: FrameStream) {
    while let Some(frame) = stream.next().await {
        let Some(bridge) = inner.upgrade() else {
            return;
        };
        match frame {
            Ok(text) => bridge.handle_frame(&text),
            Err(e) => {
                tracing::warn!("Godot connection error: {:#}", e);
                break;
            }
        }
    }

    if let Some(inner) = inner.upgrade() {
        inner.link_closed(generation);
    }
}
