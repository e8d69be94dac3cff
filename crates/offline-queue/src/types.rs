//! Queue records, status snapshots, and broadcast events.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Mutating HTTP verbs the queue records and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteMethod {
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "DELETE")]
    Delete,
}

impl WriteMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Request payload: pre-serialized at enqueue time, or structured and
/// serialized at send time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Raw(String),
    Json(serde_json::Value),
}

impl Body {
    /// Wire form of the payload.
    pub fn to_payload(&self) -> String {
        match self {
            Self::Raw(raw) => raw.clone(),
            Self::Json(value) => value.to_string(),
        }
    }
}

/// A durable record of one deferred mutating network call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation {
    pub id: String,
    pub method: WriteMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Unix-millisecond enqueue timestamp; the FIFO ordering key.
    pub enqueued_at: i64,
}

/// What a caller asks the queue to record.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub method: WriteMethod,
    pub url: String,
    pub body: Option<Body>,
    /// When `None`, the operation gets a JSON content-type header.
    pub headers: Option<HashMap<String, String>>,
}

impl WriteRequest {
    pub fn new(method: WriteMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: None,
        }
    }

    pub fn json(method: WriteMethod, url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method,
            url: url.into(),
            body: Some(Body::Json(body)),
            headers: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub(crate) fn into_operation(self, now_millis: i64) -> QueuedOperation {
        QueuedOperation {
            id: poollog_core::sync::operation_id(now_millis),
            method: self.method,
            url: self.url,
            body: self.body,
            headers: self.headers.unwrap_or_else(default_headers),
            enqueued_at: now_millis,
        }
    }
}

pub(crate) fn default_headers() -> HashMap<String, String> {
    HashMap::from([("content-type".to_string(), "application/json".to_string())])
}

/// Last-sync metadata persisted next to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMeta {
    /// Unix millis of the most recent fully-drained pass.
    pub last_sync_at: Option<i64>,
}

/// Derived queue state, recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub online: bool,
    pub queued: usize,
    pub syncing: bool,
    pub last_sync_at: Option<i64>,
}

/// Broadcast to subscribers on every observable queue change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueEvent {
    Enqueue,
    SyncStart,
    SyncProgress,
    SyncEnd,
}

/// How a drain pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Nothing was queued; no pass ran.
    Empty,
    /// The pass emptied the queue.
    Drained,
    /// Offline before or during the pass; the remainder is retained.
    Offline,
    /// Halted on a session/outage failure; the remainder is retained.
    Halted,
    /// Another pass was already in flight; nothing was attempted.
    AlreadyDraining,
}

/// Result of a convenience write: delivered immediately, or durably queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub queued: bool,
    /// HTTP status when a response was received.
    pub status: Option<u16>,
    /// Id of the queued operation when `queued` is true.
    pub operation_id: Option<String>,
}
