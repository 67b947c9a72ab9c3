//! Request/response correlation for OBS `Request` (op 6) messages.
//!
//! # How correlation works (for beginners)
//!
//! Many callers may ask OBS for something at the same time, and OBS may
//! answer in any order.  Each request therefore carries a fresh `requestId`,
//! and the matching `RequestResponse` echoes it back:
//!
//! ```text
//! caller A ── send("GetSceneList") ──> id 7f3a.. ──┐
//! caller B ── send("GetVersion")   ──> id 12c9.. ──┤──> socket ──> OBS
//!                                                  │
//! OBS ──> RequestResponse{12c9..} ──> resolve ─────┼──> wakes caller B
//! OBS ──> RequestResponse{7f3a..} ──> resolve ─────┘──> wakes caller A
//! ```
//!
//! The pending table maps each id to a `oneshot::Sender`; the caller awaits
//! the matching receiver.  Every entry leaves the table exactly once:
//! through a response, a timeout, a failed send, or [`RequestCorrelator::drain_all`]
//! when the connection goes away.  No caller can wait forever.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use midi_obs_core::protocol::messages::{ObsMessage, RequestMessage};
use midi_obs_core::protocol::encode_message;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Error returned by a [`FrameSink`] that can no longer transmit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The connection behind the sink has been closed.
    #[error("transport closed")]
    Closed,
}

/// Outbound half of a connection, as seen by the correlator.
///
/// Implementations must not block; they hand the frame to whatever task owns
/// the socket.
#[cfg_attr(test, mockall::automock)]
pub trait FrameSink: Send + Sync {
    /// Queues one text frame for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] if the transport is gone.
    fn send_frame(&self, frame: String) -> Result<(), SinkError>;
}

type PendingTx = oneshot::Sender<Option<Value>>;

/// Tracks in-flight requests for a single connection.
pub struct RequestCorrelator {
    pending: Mutex<HashMap<String, PendingTx>>,
    timeout: Option<Duration>,
}

impl RequestCorrelator {
    /// Creates an empty correlator.  `timeout` of `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, PendingTx>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends `request_type` through `sink` and waits for the matching response.
    ///
    /// Returns the response's `responseData` on success (`Value::Null` if OBS
    /// sent none) and `None` when the request failed, timed out, could not be
    /// sent, or the connection drained.
    pub async fn send(&self, request_type: &str, sink: &dyn FrameSink) -> Option<Value> {
        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.table().insert(request_id.clone(), tx);

        let frame = match encode_message(&ObsMessage::Request(RequestMessage {
            request_type: request_type.to_string(),
            request_id: request_id.clone(),
        })) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("could not encode {request_type} request: {e}");
                self.table().remove(&request_id);
                return None;
            }
        };

        if let Err(e) = sink.send_frame(frame) {
            debug!("{request_type} request {request_id} not sent: {e}");
            self.table().remove(&request_id);
            return None;
        }
        trace!("sent {request_type} request {request_id}");

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("{request_type} request {request_id} timed out after {limit:?}");
                    self.resolve(&request_id, false, None);
                    return None;
                }
            },
            None => rx.await,
        };
        // A dropped sender means the entry was discarded without an answer.
        outcome.unwrap_or(None)
    }

    /// Completes the pending request `request_id`.
    ///
    /// The waiting caller receives `data` (or `Value::Null` when absent) if
    /// `success` is true, and `None` otherwise.  Returns `false` when no such
    /// request is pending; late, duplicate, and unsolicited responses end up
    /// here and are ignored.
    pub fn resolve(&self, request_id: &str, success: bool, data: Option<Value>) -> bool {
        let Some(tx) = self.table().remove(request_id) else {
            trace!("ignoring response for unknown request {request_id}");
            return false;
        };
        let result = success.then(|| data.unwrap_or(Value::Null));
        // The caller may have given up already; that is not an error.
        let _ = tx.send(result);
        true
    }

    /// Completes every pending request with `None` and empties the table.
    ///
    /// Returns the number of requests that were drained.
    pub fn drain_all(&self) -> usize {
        let drained: Vec<PendingTx> = self.table().drain().map(|(_, tx)| tx).collect();
        let count = drained.len();
        for tx in drained {
            let _ = tx.send(None);
        }
        count
    }

    /// Number of requests currently awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.table().len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use midi_obs_core::decode_message;
    use serde_json::json;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    use super::*;

    /// Mock sink that accepts every frame and records it.
    fn capturing_sink() -> (MockFrameSink, Arc<Mutex<Vec<String>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&frames);
        let mut sink = MockFrameSink::new();
        sink.expect_send_frame().returning(move |frame| {
            captured.lock().unwrap().push(frame);
            Ok(())
        });
        (sink, frames)
    }

    fn request_id_of(frame: &str) -> String {
        match decode_message(frame).expect("frame must decode") {
            ObsMessage::Request(request) => request.request_id,
            other => panic!("expected Request, got {}", other.kind_name()),
        }
    }

    fn sent_ids(frames: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        frames.lock().unwrap().iter().map(|f| request_id_of(f)).collect()
    }

    #[test]
    fn test_send_transmits_request_frame_with_type() {
        // Arrange
        let correlator = RequestCorrelator::new(None);
        let (sink, frames) = capturing_sink();

        // Act
        let mut fut = task::spawn(correlator.send("GetSceneList", &sink));
        assert_pending!(fut.poll());

        // Assert
        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        match decode_message(&frames[0]).unwrap() {
            ObsMessage::Request(request) => assert_eq!(request.request_type, "GetSceneList"),
            other => panic!("unexpected {}", other.kind_name()),
        }
        assert_eq!(correlator.pending_count(), 1);
    }

    #[test]
    fn test_resolve_success_completes_with_data() {
        // Arrange
        let correlator = RequestCorrelator::new(None);
        let (sink, frames) = capturing_sink();
        let mut fut = task::spawn(correlator.send("GetSceneList", &sink));
        assert_pending!(fut.poll());
        let id = sent_ids(&frames).remove(0);

        // Act
        let found = correlator.resolve(&id, true, Some(json!({"scenes": []})));

        // Assert
        assert!(found);
        assert!(fut.is_woken());
        assert_ready_eq!(fut.poll(), Some(json!({"scenes": []})));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_resolve_success_without_data_completes_with_null() {
        let correlator = RequestCorrelator::new(None);
        let (sink, frames) = capturing_sink();
        let mut fut = task::spawn(correlator.send("SetCurrentProgramScene", &sink));
        assert_pending!(fut.poll());

        correlator.resolve(&sent_ids(&frames)[0], true, None);

        assert_ready_eq!(fut.poll(), Some(Value::Null));
    }

    #[test]
    fn test_resolve_failure_completes_with_none_even_with_data() {
        let correlator = RequestCorrelator::new(None);
        let (sink, frames) = capturing_sink();
        let mut fut = task::spawn(correlator.send("GetSceneList", &sink));
        assert_pending!(fut.poll());

        correlator.resolve(&sent_ids(&frames)[0], false, Some(json!({"scenes": []})));

        assert_ready_eq!(fut.poll(), None);
    }

    #[test]
    fn test_resolve_unknown_id_is_ignored() {
        // Arrange
        let correlator = RequestCorrelator::new(None);
        let (sink, _frames) = capturing_sink();
        let mut fut = task::spawn(correlator.send("GetVersion", &sink));
        assert_pending!(fut.poll());

        // Act
        let found = correlator.resolve("never-sent", true, Some(json!({})));

        // Assert
        assert!(!found);
        assert_eq!(correlator.pending_count(), 1);
        assert_pending!(fut.poll());
    }

    #[test]
    fn test_duplicate_response_is_ignored() {
        let correlator = RequestCorrelator::new(None);
        let (sink, frames) = capturing_sink();
        let mut fut = task::spawn(correlator.send("GetVersion", &sink));
        assert_pending!(fut.poll());
        let id = sent_ids(&frames).remove(0);

        assert!(correlator.resolve(&id, true, Some(json!(1))));
        assert!(!correlator.resolve(&id, true, Some(json!(2))));

        assert_ready_eq!(fut.poll(), Some(json!(1)));
    }

    #[test]
    fn test_out_of_order_responses_reach_their_own_callers() {
        // Arrange
        let correlator = RequestCorrelator::new(None);
        let (sink, frames) = capturing_sink();
        let mut first = task::spawn(correlator.send("GetSceneList", &sink));
        let mut second = task::spawn(correlator.send("GetVersion", &sink));
        assert_pending!(first.poll());
        assert_pending!(second.poll());
        let ids = sent_ids(&frames);
        assert_ne!(ids[0], ids[1], "request ids must be unique");

        // Act – answer the second request first
        correlator.resolve(&ids[1], true, Some(json!("version")));
        correlator.resolve(&ids[0], true, Some(json!("scenes")));

        // Assert
        assert_ready_eq!(second.poll(), Some(json!("version")));
        assert_ready_eq!(first.poll(), Some(json!("scenes")));
    }

    #[test]
    fn test_drain_all_resolves_every_pending_request_with_none() {
        // Arrange
        let correlator = RequestCorrelator::new(None);
        let (sink, _frames) = capturing_sink();
        let mut futures: Vec<_> = (0..5)
            .map(|_| task::spawn(correlator.send("GetVersion", &sink)))
            .collect();
        for fut in &mut futures {
            assert_pending!(fut.poll());
        }

        // Act
        let drained = correlator.drain_all();

        // Assert
        assert_eq!(drained, 5);
        assert_eq!(correlator.pending_count(), 0);
        for fut in &mut futures {
            assert_ready_eq!(fut.poll(), None);
        }
    }

    #[test]
    fn test_drain_all_on_empty_table_is_noop() {
        assert_eq!(RequestCorrelator::new(None).drain_all(), 0);
    }

    #[test]
    fn test_closed_sink_fails_fast_without_leaking() {
        // Arrange
        let correlator = RequestCorrelator::new(None);
        let mut sink = MockFrameSink::new();
        sink.expect_send_frame()
            .times(1)
            .returning(|_| Err(SinkError::Closed));

        // Act
        let mut fut = task::spawn(correlator.send("GetSceneList", &sink));

        // Assert
        assert_ready_eq!(fut.poll(), None);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_resolves_to_none_and_forgets_request() {
        // Arrange
        let correlator = RequestCorrelator::new(Some(Duration::from_secs(5)));
        let (sink, frames) = capturing_sink();

        // Act – nobody answers; paused time auto-advances to the deadline
        let result = correlator.send("GetSceneList", &sink).await;

        // Assert
        assert_eq!(result, None);
        assert_eq!(correlator.pending_count(), 0);
        let id = sent_ids(&frames).remove(0);
        assert!(!correlator.resolve(&id, true, None), "late response must be ignored");
    }

    #[tokio::test]
    async fn test_response_before_timeout_wins() {
        let correlator = Arc::new(RequestCorrelator::new(Some(Duration::from_secs(30))));
        let (sink, frames) = capturing_sink();
        let responder = {
            let correlator = Arc::clone(&correlator);
            let frames = Arc::clone(&frames);
            tokio::spawn(async move {
                loop {
                    let ids = sent_ids(&frames);
                    if let Some(id) = ids.first() {
                        correlator.resolve(id, true, Some(json!({"ok": true})));
                        break;
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        let result = correlator.send("GetStats", &sink).await;

        responder.await.unwrap();
        assert_eq!(result, Some(json!({"ok": true})));
    }
}
