//! Table of commands sent but not yet answered

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use super::BridgeError;

pub type Outcome = Result<Value, BridgeError>;

/// One outstanding command
///
/// Taking the call out of the table is what grants the right to fulfil it,
/// so a slot can never be resolved twice.
pub struct PendingCall {
    command: String,
    created_at: Instant,
    slot: oneshot::Sender<Outcome>,
}

impl PendingCall {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn fulfil(self, outcome: Outcome) {
        tracing::debug!(
            "Command '{}' settled after {:?}",
            self.command,
            self.created_at.elapsed()
        );
        // The caller may have given up already; nothing else to do then.
        let _ = self.slot.send(outcome);
    }
}

/// Correlation-id keyed map of [`PendingCall`]s
#[derive(Default)]
pub struct PendingCalls {
    next_id: AtomicU64,
    calls: Mutex<HashMap<String, PendingCall>>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a call under a fresh correlation id
    pub fn register(&self, command: &str) -> (String, oneshot::Receiver<Outcome>) {
        let (slot, receiver) = oneshot::channel();
        let mut calls = self.calls.lock();
        let id = loop {
            let id = format!("cmd_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
            if !calls.contains_key(&id) {
                break id;
            }
        };
        calls.insert(
            id.clone(),
            PendingCall {
                command: command.to_string(),
                created_at: Instant::now(),
                slot,
            },
        );
        (id, receiver)
    }

    /// Remove a call so it can be fulfilled
    pub fn take(&self, id: &str) -> Option<PendingCall> {
        self.calls.lock().remove(id)
    }

    /// Fail every pending call, returning how many there were
    pub fn fail_all(&self, error: impl Fn() -> BridgeError) -> usize {
        let drained: Vec<PendingCall> = self.calls.lock().drain().map(|(_, call)| call).collect();
        let count = drained.len();
        for call in drained {
            call.fulfil(Err(error()));
        }
        count
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}

/// Removes a call from the table when the waiting caller goes away
///
/// Covers timeouts and callers whose future is dropped mid-wait; after a
/// normal response the call is already gone and this is a no-op.
pub struct PendingGuard<'a> {
    pub calls: &'a PendingCalls,
    pub id: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.calls.take(self.id).is_some() {
            tracing::debug!("Discarded pending command {}", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_issues_unique_ids() {
        let calls = PendingCalls::new();
        let (a, _ra) = calls.register("read_file");
        let (b, _rb) = calls.register("read_file");
        assert_ne!(a, b);
        assert_eq!(calls.len(), 2);
    }

    #[tokio::test]
    async fn test_take_then_fulfil() {
        let calls = PendingCalls::new();
        let (id, receiver) = calls.register("get_project_settings");

        let call = calls.take(&id).expect("call is pending");
        assert_eq!(call.command(), "get_project_settings");
        call.fulfil(Ok(json!({"name": "demo"})));

        assert_eq!(receiver.await.unwrap().unwrap(), json!({"name": "demo"}));
        assert!(calls.take(&id).is_none());
        assert!(calls.is_empty());
    }

    #[tokio::test]
    async fn test_fail_all_empties_table() {
        let calls = PendingCalls::new();
        let receivers: Vec<_> = (0..3).map(|_| calls.register("noop").1).collect();

        assert_eq!(calls.fail_all(|| BridgeError::ConnectionLost), 3);
        assert!(calls.is_empty());
        for receiver in receivers {
            assert!(matches!(receiver.await.unwrap(), Err(BridgeError::ConnectionLost)));
        }
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let calls = PendingCalls::new();
        let (id, _receiver) = calls.register("noop");
        {
            let _guard = PendingGuard {
                calls: &calls,
                id: &id,
            };
        }
        assert!(calls.is_empty());
    }
}
