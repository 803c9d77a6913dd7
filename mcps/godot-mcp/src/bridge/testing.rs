//! In-memory stand-in for the Godot editor plugin

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use serde_json::Value;

use super::{Connector, Link};

#[derive(Default)]
struct Shared {
    attempts: AtomicUsize,
    refuse: AtomicBool,
}

/// Connector half: handed to the bridge
pub(crate) struct FakeConnector {
    shared: Arc<Shared>,
    accepted: tokio::sync::mpsc::UnboundedSender<FakeLink>,
}

/// Godot half: kept by the test to answer requests
pub(crate) struct FakeGodot {
    shared: Arc<Shared>,
    accepted: tokio::sync::mpsc::UnboundedReceiver<FakeLink>,
}

/// One accepted connection, seen from the Godot side
///
/// Dropping it closes the connection.
pub(crate) struct FakeLink {
    requests: mpsc::UnboundedReceiver<String>,
    responses: mpsc::UnboundedSender<String>,
}

pub(crate) fn fake_godot() -> (FakeConnector, FakeGodot) {
    let shared = Arc::new(Shared::default());
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    (
        FakeConnector {
            shared: shared.clone(),
            accepted: tx,
        },
        FakeGodot {
            shared,
            accepted: rx,
        },
    )
}

#[async_trait]
impl Connector for FakeConnector {
    fn endpoint(&self) -> &str {
        "ws://fake-godot"
    }

    async fn connect(&self) -> anyhow::Result<Link> {
        self.shared.attempts.fetch_add(1, Ordering::SeqCst);
        if self.shared.refuse.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }

        let (req_tx, req_rx) = mpsc::unbounded();
        let (resp_tx, resp_rx) = mpsc::unbounded();
        self.accepted
            .send(FakeLink {
                requests: req_rx,
                responses: resp_tx,
            })
            .map_err(|_| anyhow::anyhow!("fake Godot is gone"))?;

        Ok(Link {
            sink: Box::pin(req_tx.sink_map_err(anyhow::Error::from)),
            stream: resp_rx.map(Ok).boxed(),
        })
    }
}

impl FakeGodot {
    pub(crate) fn attempts(&self) -> usize {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn refuse_connections(&self, refuse: bool) {
        self.shared.refuse.store(refuse, Ordering::SeqCst);
    }

    pub(crate) async fn accept(&mut self) -> FakeLink {
        self.accepted.recv().await.expect("connector dropped")
    }

    pub(crate) fn try_accept(&mut self) -> Option<FakeLink> {
        self.accepted.try_recv().ok()
    }
}

impl FakeLink {
    /// Next request frame, parsed
    pub(crate) async fn next_request(&mut self) -> Value {
        let frame = self.requests.next().await.expect("bridge closed the link");
        serde_json::from_str(&frame).expect("request frame is JSON")
    }

    pub(crate) fn respond(&mut self, frame: Value) {
        self.respond_raw(&frame.to_string());
    }

    pub(crate) fn respond_raw(&mut self, frame: &str) {
        let _ = self.responses.unbounded_send(frame.to_string());
    }

    /// Answer each request with `answer(command, params)` until the link closes
    pub(crate) fn serve<F>(mut self, answer: F) -> tokio::task::JoinHandle<()>
    where
        F: Fn(&str, &Value) -> Result<Value, String> + Send + 'static,
    {
        tokio::spawn(async move {
            while let Some(frame) = self.requests.next().await {
                let Ok(request) = serde_json::from_str::<Value>(&frame) else {
                    continue;
                };
                let command = request["command"].as_str().unwrap_or_default();
                let response = match answer(command, &request["params"]) {
                    Ok(result) => serde_json::json!({
                        "id": request["id"],
                        "success": true,
                        "result": result,
                    }),
                    Err(error) => serde_json::json!({
                        "id": request["id"],
                        "success": false,
                        "error": error,
                    }),
                };
                self.respond(response);
            }
        })
    }
}
