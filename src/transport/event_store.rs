//! Resumable Event Store
//!
//! Backs the Streamable HTTP transport's `Last-Event-ID` replay: every
//! server-to-client message sent on a stream is also appended here, keyed by
//! a monotonically increasing ordinal within that stream. A client that
//! reconnects with `Last-Event-ID: N` gets everything after `N` replayed
//! before the stream goes live again.
//!
//! Grounded on the bounded-backlog-per-stream approach used for SSE replay
//! in other MCP servers (a FIFO of bounded size per stream id), re-expressed
//! with `DashMap`/`VecDeque` to match this crate's session-store idiom.

use std::collections::VecDeque;

use dashmap::DashMap;
use serde_json::Value;

/// Default number of events retained per stream before the oldest are
/// evicted.
pub const DEFAULT_BACKLOG: usize = 256;

/// A single replayable event.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub id: u64,
    pub data: Value,
}

/// Per-stream FIFO backlog of events, bounded so long-lived streams can't
/// grow memory without limit.
struct Stream {
    next_id: u64,
    backlog: VecDeque<StoredEvent>,
    capacity: usize,
}

impl Stream {
    fn new(capacity: usize) -> Self {
        Self {
            next_id: 1,
            backlog: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn append(&mut self, data: Value) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        if self.backlog.len() == self.capacity {
            self.backlog.pop_front();
        }
        self.backlog.push_back(StoredEvent { id, data });

        id
    }

    fn replay_after(&self, last_event_id: u64) -> Vec<StoredEvent> {
        self.backlog
            .iter()
            .filter(|event| event.id > last_event_id)
            .cloned()
            .collect()
    }
}

/// Bounded, per-stream event backlog for Streamable HTTP resumability.
pub struct EventStore {
    streams: DashMap<String, Stream>,
    capacity: usize,
}

impl EventStore {
    /// Create an event store with the default per-stream backlog size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BACKLOG)
    }

    /// Create an event store with a custom per-stream backlog size.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            streams: DashMap::new(),
            capacity,
        }
    }

    /// Append an event to `stream_id`'s backlog and return its assigned id,
    /// which the caller sends to the client as the SSE `id:` field.
    pub fn append(&self, stream_id: &str, data: Value) -> u64 {
        let mut stream = self
            .streams
            .entry(stream_id.to_string())
            .or_insert_with(|| Stream::new(self.capacity));
        stream.append(data)
    }

    /// Replay every event after `last_event_id` for the given stream, in
    /// order. Returns an empty vec if the stream is unknown (it has either
    /// never existed or aged out) or nothing postdates `last_event_id`.
    pub fn replay_after(&self, stream_id: &str, last_event_id: u64) -> Vec<StoredEvent> {
        self.streams
            .get(stream_id)
            .map(|stream| stream.replay_after(last_event_id))
            .unwrap_or_default()
    }

    /// Drop a stream's backlog entirely, e.g. on session termination.
    pub fn remove(&self, stream_id: &str) {
        self.streams.remove(stream_id);
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_assigns_increasing_ids() {
        let store = EventStore::new();
        let id1 = store.append("s1", json!({"n": 1}));
        let id2 = store.append("s1", json!({"n": 2}));
        assert!(id2 > id1);
    }

    #[test]
    fn test_replay_after_returns_only_newer_events() {
        let store = EventStore::new();
        let id1 = store.append("s1", json!({"n": 1}));
        store.append("s1", json!({"n": 2}));
        store.append("s1", json!({"n": 3}));

        let replayed = store.replay_after("s1", id1);
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].data["n"], 2);
        assert_eq!(replayed[1].data["n"], 3);
    }

    #[test]
    fn test_replay_unknown_stream_is_empty() {
        let store = EventStore::new();
        assert!(store.replay_after("missing", 0).is_empty());
    }

    #[test]
    fn test_backlog_is_bounded() {
        let store = EventStore::with_capacity(2);
        store.append("s1", json!({"n": 1}));
        store.append("s1", json!({"n": 2}));
        store.append("s1", json!({"n": 3}));

        let replayed = store.replay_after("s1", 0);
        assert_eq!(replayed.len(), 2);
        assert_eq!(replayed[0].data["n"], 2);
        assert_eq!(replayed[1].data["n"], 3);
    }

    #[test]
    fn test_remove_drops_backlog() {
        let store = EventStore::new();
        store.append("s1", json!({"n": 1}));
        store.remove("s1");
        assert!(store.replay_after("s1", 0).is_empty());
    }
}
