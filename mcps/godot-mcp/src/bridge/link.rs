//! Transport under the command bridge
//!
//! A [`Link`] is a pair of text-frame sink and stream. The bridge only ever
//! sees this pair, so tests can swap the WebSocket for in-memory channels.

use std::pin::Pin;

use anyhow::Context;
use async_trait::async_trait;
use futures::{future, stream::BoxStream, Sink, SinkExt, StreamExt};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
};

pub type FrameSink = Pin<Box<dyn Sink<String, Error = anyhow::Error> + Send>>;
pub type FrameStream = BoxStream<'static, anyhow::Result<String>>;

/// One established downstream connection
///
/// The stream ending (or yielding an error) means the connection is gone.
pub struct Link {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens downstream connections
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Where this connector dials, for logs and errors
    fn endpoint(&self) -> &str;

    async fn connect(&self) -> anyhow::Result<Link>;
}

/// Connects to the editor plugin's WebSocket server
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn connect(&self) -> anyhow::Result<Link> {
        let (ws, _) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("WebSocket handshake with {} failed", self.url))?;
        let (ws_tx, ws_rx) = ws.split();

        let sink = ws_tx
            .with(|frame: String| future::ready(Ok::<_, WsError>(Message::Text(frame.into()))))
            .sink_map_err(anyhow::Error::from);

        // Only text frames carry responses; pings and pongs are answered by tungstenite.
        let stream = ws_rx.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => String::from_utf8(bytes.to_vec()).ok().map(Ok),
                Ok(_) => None,
                Err(e) => Some(Err(anyhow::Error::from(e))),
            })
        });

        Ok(Link {
            sink: Box::pin(sink),
            stream: stream.boxed(),
        })
    }
}
