//! HTTP/SSE session multiplexer

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Router,
};
use futures::{future, stream, stream::BoxStream, Stream, StreamExt};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::{SessionChannels, SessionId, SessionRegistry, SessionService, TransportError};

/// Route that opens a session's event stream
pub const OUT_PATH: &str = "/out";
/// Route that accepts messages posted for a session
pub const IN_PATH: &str = "/in";
/// Header carrying the session id on `POST /in` (takes precedence over the query)
pub const SESSION_ID_HEADER: &str = "x-session-id";
/// Query parameter carrying the session id on `POST /in`
pub const SESSION_ID_QUERY: &str = "sessionId";
/// Largest accepted `POST /in` body
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Settings for [`SseMultiplexer`]
#[derive(Debug, Clone)]
pub struct SseConfig {
    pub bind: SocketAddr,
    pub max_body_bytes: usize,
    /// Depth of each session's inbound queue
    pub session_buffer: usize,
    pub keep_alive: Duration,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5050)),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            session_buffer: 64,
            keep_alive: Duration::from_secs(15),
        }
    }
}

/// Accepts event-stream subscriptions and routes posted messages to them
pub struct SseMultiplexer<S: SessionService> {
    service: S,
    registry: Arc<SessionRegistry<S::Inbound>>,
    config: SseConfig,
}

impl<S: SessionService> SseMultiplexer<S> {
    pub fn new(service: S, config: SseConfig) -> Self {
        Self {
            service,
            registry: Arc::new(SessionRegistry::new()),
            config,
        }
    }

    pub fn config(&self) -> &SseConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionRegistry<S::Inbound> {
        &self.registry
    }

    /// Build the axum router serving `GET /out` and `POST /in`
    ///
    /// Every other method or path answers 404.
    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route(OUT_PATH, get(subscribe::<S>).fallback(not_found))
            .route(IN_PATH, post(post_message::<S>).fallback(not_found))
            .fallback(not_found)
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }

    /// Serve until `shutdown` resolves, then close every open session
    ///
    /// Sessions are closed before the graceful drain starts; open event
    /// streams would otherwise keep the server alive forever.
    pub async fn serve<F>(self: Arc<Self>, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mux = self.clone();
        let shutdown = async move {
            shutdown.await;
            let closed = mux.close_all();
            tracing::info!("Shutting down, closed {} session(s)", closed);
        };

        tracing::info!("Out link (SSE): http://{}{}", listener.local_addr()?, OUT_PATH);
        tracing::info!("In link: http://{}{}", listener.local_addr()?, IN_PATH);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    /// Register a new session and return its event stream
    pub fn open_session(&self) -> SessionStream<S::Inbound> {
        let (inbound_tx, inbound_rx) = mpsc::channel(self.config.session_buffer);
        let (outbound_tx, outbound_rx) = futures::channel::mpsc::unbounded();

        let id = self.registry.create(inbound_tx);
        tracing::info!(session = %id, "Session created");

        self.service.attach(SessionChannels {
            id: id.clone(),
            inbound: inbound_rx,
            outbound: outbound_tx,
        });

        let endpoint = format!("{}?{}={}", IN_PATH, SESSION_ID_QUERY, id);
        let first = stream::once(future::ready(Ok::<_, axum::Error>(
            Event::default().event("endpoint").data(endpoint),
        )));
        let messages = outbound_rx.map(|message| Event::default().event("message").json_data(message));

        SessionStream {
            events: first.chain(messages).boxed(),
            _guard: SessionGuard {
                id,
                registry: self.registry.clone(),
            },
        }
    }

    /// Close one session; its event stream ends once the handler stops
    pub fn close(&self, id: &str) -> bool {
        self.registry.remove(id).is_some()
    }

    /// Close every session, returning how many were open
    pub fn close_all(&self) -> usize {
        self.registry.clear()
    }

    /// Route one posted body to its session
    async fn dispatch(
        &self,
        session_id: Option<String>,
        headers: &HeaderMap,
        body: Body,
    ) -> Result<(), TransportError> {
        let session_id = session_id.ok_or(TransportError::MissingSessionId)?;
        let session = self
            .registry
            .get(&session_id)
            .ok_or_else(|| TransportError::UnknownSession(session_id.clone()))?;

        require_json(headers)?;
        let bytes = read_body(body, self.config.max_body_bytes).await?;
        let message: S::Inbound =
            serde_json::from_slice(&bytes).map_err(TransportError::MalformedMessage)?;

        tracing::debug!(session = %session_id, "Delivering message ({} bytes)", bytes.len());
        session.deliver(message).await
    }
}

/// Event stream of one session
///
/// Owns the session's registration: when the client disconnects, the HTTP
/// layer drops the stream and the session is removed exactly once.
pub struct SessionStream<I> {
    events: BoxStream<'static, Result<Event, axum::Error>>,
    _guard: SessionGuard<I>,
}

impl<I> Stream for SessionStream<I> {
    type Item = Result<Event, axum::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_next_unpin(cx)
    }
}

struct SessionGuard<I> {
    id: SessionId,
    registry: Arc<SessionRegistry<I>>,
}

impl<I> Drop for SessionGuard<I> {
    fn drop(&mut self) {
        if self.registry.remove(self.id.as_str()).is_some() {
            tracing::info!(session = %self.id, "Client disconnected");
        } else {
            tracing::debug!(session = %self.id, "Event stream closed after session teardown");
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

async fn subscribe<S: SessionService>(
    State(mux): State<Arc<SseMultiplexer<S>>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = mux.open_session();
    Sse::new(stream).keep_alive(KeepAlive::new().interval(mux.config.keep_alive))
}

async fn post_message<S: SessionService>(
    State(mux): State<Arc<SseMultiplexer<S>>>,
    Query(query): Query<PostQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, TransportError> {
    let from_header = headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned);
    let session_id = from_header.or(query.session_id.filter(|value| !value.is_empty()));

    mux.dispatch(session_id, &headers, body).await?;
    Ok(StatusCode::OK)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

fn require_json(headers: &HeaderMap) -> Result<(), TransportError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .ok_or(TransportError::UnsupportedMediaType)?;

    if content_type.essence_str() != mime::APPLICATION_JSON.essence_str() {
        return Err(TransportError::UnsupportedMediaType);
    }
    match content_type.get_param(mime::CHARSET) {
        Some(charset) if charset != mime::UTF_8 => Err(TransportError::UnsupportedMediaType),
        _ => Ok(()),
    }
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes, TransportError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(TransportError::PayloadTooLarge { limit })
        }
        Err(err) => Err(TransportError::BodyRead(err.to_string())),
    }
}
