//! Event buffers and passive query helpers.
//!
//! Three independent append-only logs, populated by the dispatcher and
//! read by callers: generic push events, channel-incoming events, and
//! notifications (id-less notifications plus `channels/changed` records).
//! Buffers grow for the life of the session and are dropped wholesale at
//! teardown; readers tolerate brief staleness and re-poll.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{json, Value};

/// Interval between scans of the incoming buffer while waiting for a match.
pub const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Buffer lengths captured before a collection window opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSnapshot {
    /// Length of the push-event buffer at snapshot time.
    pub push_events: usize,
    /// Length of the channel-incoming buffer at snapshot time.
    pub incoming: usize,
}

/// The three append-only event logs.
#[derive(Debug, Default)]
pub struct EventBuffers {
    push_events: Mutex<Vec<Value>>,
    incoming: Mutex<Vec<Value>>,
    notifications: Mutex<Vec<Value>>,
}

impl EventBuffers {
    /// Create empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a generic push event.
    pub fn push_event(&self, payload: Value) {
        lock(&self.push_events).push(payload);
    }

    /// Append a channel-incoming event.
    pub fn push_incoming(&self, payload: Value) {
        lock(&self.incoming).push(payload);
    }

    /// Append a notification record.
    pub fn push_notification(&self, payload: Value) {
        lock(&self.notifications).push(payload);
    }

    /// Capture the current push/incoming lengths. Events appended after the
    /// snapshot are exactly the ones returned by [`Self::push_events_from`]
    /// and [`Self::incoming_from`] with these indices.
    #[must_use]
    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            push_events: lock(&self.push_events).len(),
            incoming: lock(&self.incoming).len(),
        }
    }

    /// Push events appended at or after index `start`.
    #[must_use]
    pub fn push_events_from(&self, start: usize) -> Vec<Value> {
        lock(&self.push_events).get(start..).unwrap_or_default().to_vec()
    }

    /// Channel-incoming events appended at or after index `start`.
    #[must_use]
    pub fn incoming_from(&self, start: usize) -> Vec<Value> {
        lock(&self.incoming).get(start..).unwrap_or_default().to_vec()
    }

    /// Snapshot of the full push-event log.
    #[must_use]
    pub fn push_events_snapshot(&self) -> Vec<Value> {
        lock(&self.push_events).clone()
    }

    /// Snapshot of the full channel-incoming log.
    #[must_use]
    pub fn incoming_snapshot(&self) -> Vec<Value> {
        lock(&self.incoming).clone()
    }

    /// Snapshot of the full notification log.
    #[must_use]
    pub fn notifications_snapshot(&self) -> Vec<Value> {
        lock(&self.notifications).clone()
    }
}

fn lock(buf: &Mutex<Vec<Value>>) -> MutexGuard<'_, Vec<Value>> {
    buf.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Poll the channel-incoming buffer until `extract` yields a match or
/// `timeout` elapses.
///
/// The buffer is scanned from index 0 on every pass, so entries that were
/// already present when the wait began are examined first. Returns `None`
/// on deadline expiry.
pub async fn wait_for_match<T, F>(buffers: &EventBuffers, timeout: Duration, extract: F) -> Option<T>
where
    F: Fn(&[Value]) -> Option<T>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let entries = buffers.incoming_snapshot();
        if let Some(found) = extract(&entries) {
            return Some(found);
        }
        let now = tokio::time::Instant::now();
        if now >= deadline {
            return None;
        }
        tokio::time::sleep(EVENT_POLL_INTERVAL.min(deadline - now)).await;
    }
}

/// Scan one channel-incoming entry for a text content block whose payload is
/// a JSON object with `"type"` equal to `event_type`.
///
/// Text blocks that fail to parse as JSON fall back to raw substring
/// matching and, on a hit, are returned wrapped as `{"_raw": <text>}`.
#[must_use]
pub fn match_incoming(entry: &Value, event_type: &str) -> Option<Value> {
    let messages = entry.get("messages")?.as_array()?;
    for message in messages {
        let Some(content) = message.get("content").and_then(Value::as_array) else {
            continue;
        };
        for block in content {
            let Some(text) = block.get("text").and_then(Value::as_str) else {
                continue;
            };
            match serde_json::from_str::<Value>(text) {
                Ok(parsed) => {
                    if parsed.get("type").and_then(Value::as_str) == Some(event_type) {
                        return Some(parsed);
                    }
                }
                Err(_) => {
                    let compact = format!("\"type\":\"{event_type}\"");
                    let spaced = format!("\"type\": \"{event_type}\"");
                    if text.contains(&compact) || text.contains(&spaced) {
                        return Some(json!({ "_raw": text }));
                    }
                }
            }
        }
    }
    None
}
