//! The offline write queue: enqueue, drain passes, status, and events.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::Utc;
use log::{debug, warn};
use serde_json::Value;

use poollog_core::sync::{classify_status, Disposition};

use crate::connectivity::Connectivity;
use crate::store::QueueStore;
use crate::transport::Transport;
use crate::types::{
    DrainOutcome, QueueEvent, QueuedOperation, StatusSnapshot, SyncMeta, WriteMethod, WriteOutcome,
    WriteRequest,
};

type EventCallback = Arc<dyn Fn(QueueEvent, StatusSnapshot) + Send + Sync>;

struct QueueInner {
    store: QueueStore,
    transport: Arc<dyn Transport>,
    connectivity: Connectivity,
    /// Single-flight guard for drain passes.
    syncing: AtomicBool,
    subscribers: Mutex<BTreeMap<u64, EventCallback>>,
    next_subscriber: AtomicU64,
}

impl QueueInner {
    fn subscribers(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, EventCallback>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-local offline write queue.
///
/// Buffers failed or deferred mutating API calls in the store and replays
/// them in FIFO order once connectivity returns. All state lives in this
/// instance; independent queues over separate stores share nothing, so
/// several can coexist in one process.
///
/// Known limitation: the single-flight guarantee is per instance. Two
/// processes draining the same store file are not coordinated and can
/// double-deliver.
#[derive(Clone)]
pub struct OfflineQueue {
    inner: Arc<QueueInner>,
}

/// Subscription to queue events. Unsubscribes when dropped.
pub struct Subscription {
    inner: Weak<QueueInner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.subscribers().remove(&self.id);
        }
    }
}

/// Clears the syncing flag when a pass exits, including on cancellation.
struct SyncingGuard<'a>(&'a AtomicBool);

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl OfflineQueue {
    pub fn new(store: QueueStore, transport: Arc<dyn Transport>, connectivity: Connectivity) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                store,
                transport,
                connectivity,
                syncing: AtomicBool::new(false),
                subscribers: Mutex::new(BTreeMap::new()),
                next_subscriber: AtomicU64::new(0),
            }),
        }
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.inner.connectivity
    }

    /// Record a deferred mutating call; returns the operation id.
    ///
    /// Durability is best-effort: a store failure is logged and the id is
    /// still returned.
    pub fn enqueue(&self, request: WriteRequest) -> String {
        let operation = request.into_operation(Utc::now().timestamp_millis());
        let id = operation.id.clone();
        if let Err(err) = self.inner.store.append(operation) {
            warn!("failed to persist queued operation {id}: {err}");
        }
        self.emit(QueueEvent::Enqueue);
        id
    }

    /// Current derived state, recomputed on every call.
    pub fn status(&self) -> StatusSnapshot {
        let queued = match self.inner.store.load() {
            Ok(operations) => operations.len(),
            Err(err) => {
                warn!("failed to read queue for status: {err}");
                0
            }
        };
        let last_sync_at = match self.inner.store.load_meta() {
            Ok(meta) => meta.last_sync_at,
            Err(err) => {
                warn!("failed to read sync metadata for status: {err}");
                None
            }
        };
        StatusSnapshot {
            online: self.inner.connectivity.is_online(),
            queued,
            syncing: self.inner.syncing.load(Ordering::SeqCst),
            last_sync_at,
        }
    }

    /// Register a callback for `(event, snapshot)` pairs on every queue change.
    pub fn subscribe(
        &self,
        callback: impl Fn(QueueEvent, StatusSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers().insert(id, Arc::new(callback));
        Subscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    fn emit(&self, event: QueueEvent) {
        let snapshot = self.status();
        let callbacks: Vec<EventCallback> = self.inner.subscribers().values().cloned().collect();
        for callback in callbacks {
            // Each invocation is isolated: one panicking subscriber must not
            // starve the rest or take down the emitter.
            if catch_unwind(AssertUnwindSafe(|| callback(event, snapshot))).is_err() {
                warn!("queue event subscriber panicked on {event:?}");
            }
        }
    }

    /// Run one drain pass.
    ///
    /// Idempotent: while a pass is in flight, further calls return
    /// [`DrainOutcome::AlreadyDraining`] without any delivery attempts.
    pub async fn sync_now(&self) -> DrainOutcome {
        if self
            .inner
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return DrainOutcome::AlreadyDraining;
        }
        let guard = SyncingGuard(&self.inner.syncing);

        let pending = self.inner.store.load().unwrap_or_else(|err| {
            warn!("failed to load queue for drain: {err}");
            Vec::new()
        });
        if pending.is_empty() {
            drop(guard);
            return DrainOutcome::Empty;
        }

        self.emit(QueueEvent::SyncStart);
        let outcome = self.drain().await;
        if outcome == DrainOutcome::Drained {
            let meta = SyncMeta {
                last_sync_at: Some(Utc::now().timestamp_millis()),
            };
            if let Err(err) = self.inner.store.save_meta(meta) {
                warn!("failed to record sync completion: {err}");
            }
        }
        drop(guard);
        self.emit(QueueEvent::SyncEnd);
        outcome
    }

    /// Deliver head operations until the queue empties, connectivity drops,
    /// or a delivery halts the pass. Strict FIFO; one in-flight attempt.
    async fn drain(&self) -> DrainOutcome {
        loop {
            let head = match self.inner.store.load() {
                Ok(operations) => operations.into_iter().next(),
                Err(err) => {
                    warn!("failed to load queue during drain: {err}");
                    return DrainOutcome::Halted;
                }
            };
            let Some(head) = head else {
                return DrainOutcome::Drained;
            };
            if !self.inner.connectivity.is_online() {
                return DrainOutcome::Offline;
            }

            match self.inner.transport.deliver(&head).await {
                Ok(status) => match classify_status(status) {
                    Disposition::Delivered => {
                        debug!(
                            "delivered queued operation {} ({} {})",
                            head.id,
                            head.method.as_str(),
                            head.url
                        );
                        self.remove_head(&head.id);
                        self.emit(QueueEvent::SyncProgress);
                    }
                    Disposition::Drop => {
                        warn!(
                            "dropping queued operation {} ({} {}): permanently rejected with status {status}",
                            head.id,
                            head.method.as_str(),
                            head.url
                        );
                        self.remove_head(&head.id);
                        self.emit(QueueEvent::SyncProgress);
                    }
                    Disposition::Halt => {
                        debug!(
                            "halting drain pass on status {status} for operation {}",
                            head.id
                        );
                        return DrainOutcome::Halted;
                    }
                },
                Err(err) => {
                    debug!("halting drain pass on network error: {err}");
                    return DrainOutcome::Offline;
                }
            }
        }
    }

    fn remove_head(&self, id: &str) {
        if let Err(err) = self.inner.store.remove_first(id) {
            warn!("failed to remove operation {id} from queue: {err}");
        }
    }

    /// `POST` convenience wrapper; see [`OfflineQueue::try_or_queue`].
    pub async fn post(&self, url: &str, body: Value) -> WriteOutcome {
        self.try_or_queue(WriteRequest::json(WriteMethod::Post, url, body))
            .await
    }

    /// `PUT` convenience wrapper; see [`OfflineQueue::try_or_queue`].
    pub async fn put(&self, url: &str, body: Value) -> WriteOutcome {
        self.try_or_queue(WriteRequest::json(WriteMethod::Put, url, body))
            .await
    }

    /// `DELETE` convenience wrapper; see [`OfflineQueue::try_or_queue`].
    pub async fn delete(&self, url: &str, body: Value) -> WriteOutcome {
        self.try_or_queue(WriteRequest::json(WriteMethod::Delete, url, body))
            .await
    }

    /// Attempt the call directly; on a network error or any non-2xx response,
    /// fall back to enqueueing it. Never fails from the caller's viewpoint.
    pub async fn try_or_queue(&self, request: WriteRequest) -> WriteOutcome {
        let probe = request.clone().into_operation(Utc::now().timestamp_millis());
        match self.inner.transport.deliver(&probe).await {
            Ok(status) if (200..300).contains(&status) => WriteOutcome {
                queued: false,
                status: Some(status),
                operation_id: None,
            },
            Ok(status) => {
                debug!(
                    "queueing {} {} after status {status}",
                    request.method.as_str(),
                    request.url
                );
                let id = self.enqueue(request);
                WriteOutcome {
                    queued: true,
                    status: Some(status),
                    operation_id: Some(id),
                }
            }
            Err(err) => {
                debug!(
                    "queueing {} {} after network error: {err}",
                    request.method.as_str(),
                    request.url
                );
                let id = self.enqueue(request);
                WriteOutcome {
                    queued: true,
                    status: None,
                    operation_id: Some(id),
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn queued_operations(&self) -> Vec<QueuedOperation> {
        self.inner.store.load().expect("load queue")
    }
}
