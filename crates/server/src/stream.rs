//! Outbound frame buffering and pending-request correlation for the HTTP
//! transport.

use cdsync_mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

/// Frames held for a not-yet-connected stream; oldest dropped past this.
const REPLAY_LIMIT: usize = 256;

/// Server-to-client frames: live fan-out plus a replay buffer that absorbs
/// frames published while no stream subscriber is connected.
pub struct OutboundStream {
    live: broadcast::Sender<String>,
    replay: Mutex<VecDeque<String>>,
}

impl OutboundStream {
    pub fn new() -> Self {
        let (live, _) = broadcast::channel(64);
        Self {
            live,
            replay: Mutex::new(VecDeque::new()),
        }
    }

    /// Publish one frame to connected subscribers, or buffer it when nobody
    /// is listening.
    pub fn publish(&self, frame: String) {
        if self.live.receiver_count() == 0 {
            let mut replay = self.replay.lock().expect("replay buffer poisoned");
            if replay.len() == REPLAY_LIMIT {
                replay.pop_front();
                debug!("replay buffer full, dropping oldest frame");
            }
            replay.push_back(frame);
        } else {
            let _ = self.live.send(frame);
        }
    }

    /// Hand a connecting subscriber the buffered backlog and a live receiver.
    ///
    /// The receiver is subscribed before the backlog is drained, so frames
    /// published in between are not lost.
    pub fn attach(&self) -> (Vec<String>, broadcast::Receiver<String>) {
        let receiver = self.live.subscribe();
        let backlog = {
            let mut replay = self.replay.lock().expect("replay buffer poisoned");
            replay.drain(..).collect()
        };
        (backlog, receiver)
    }

    #[cfg(test)]
    fn buffered_len(&self) -> usize {
        self.replay.lock().unwrap().len()
    }
}

impl Default for OutboundStream {
    fn default() -> Self {
        Self::new()
    }
}

/// In-flight server-initiated requests awaiting a client response via
/// `POST /message`.
pub struct PendingRequests {
    next_id: AtomicI64,
    slots: Mutex<HashMap<i64, oneshot::Sender<JsonRpcResponse>>>,
    timeout: Duration,
}

impl PendingRequests {
    pub fn new(timeout: Duration) -> Self {
        Self {
            next_id: AtomicI64::new(1),
            slots: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Send a request to the client over `stream` and wait for its response.
    ///
    /// Expires after the configured timeout; the slot is removed either way.
    pub async fn send_request(
        &self,
        stream: &OutboundStream,
        method: &str,
        params: serde_json::Value,
    ) -> Result<JsonRpcResponse, RequestExpired> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.slots
            .lock()
            .expect("pending slots poisoned")
            .insert(id, tx);

        let request = JsonRpcRequest::new(id, method, params);
        match serde_json::to_string(&request) {
            Ok(frame) => stream.publish(frame),
            Err(e) => {
                self.remove(id);
                warn!(error = %e, "failed to serialize server request");
                return Err(RequestExpired { id });
            }
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            // Elapsed, or the slot's sender was dropped.
            _ => {
                self.remove(id);
                Err(RequestExpired { id })
            }
        }
    }

    /// Resolve a client response against its pending slot. Late or unknown
    /// ids are logged and dropped.
    pub fn resolve(&self, response: JsonRpcResponse) {
        let Some(id) = response.id.as_i64() else {
            warn!(id = %response.id, "response id is not numeric, dropping");
            return;
        };
        match self.remove(id) {
            Some(slot) => {
                let _ = slot.send(response);
            }
            None => warn!(id, "response for unknown or expired request, dropping"),
        }
    }

    fn remove(&self, id: i64) -> Option<oneshot::Sender<JsonRpcResponse>> {
        self.slots.lock().expect("pending slots poisoned").remove(&id)
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

/// The client never answered a server-initiated request in time.
#[derive(Debug, thiserror::Error)]
#[error("request {id} expired before the client responded")]
pub struct RequestExpired {
    pub id: i64,
}
