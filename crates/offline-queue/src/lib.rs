//! Offline write queue for the Poollog pool-water tracker.
//!
//! Mutating API calls that cannot complete immediately are recorded in a
//! local SQLite store and replayed in FIFO order once connectivity returns.
//! Live queue status is published to subscribers, and a scheduler drives
//! drain passes on connectivity-restored events, a periodic timer, and a
//! one-shot startup flush.

mod connectivity;
mod error;
mod queue;
mod scheduler;
mod store;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use connectivity::Connectivity;
pub use error::{StoreError, TransportError};
pub use queue::{OfflineQueue, Subscription};
pub use scheduler::{
    SchedulerConfig, SchedulerHandle, DEFAULT_PERIODIC_INTERVAL, DEFAULT_STARTUP_DELAY,
};
pub use store::QueueStore;
pub use transport::{HttpTransport, Transport};
pub use types::{
    Body, DrainOutcome, QueueEvent, QueuedOperation, StatusSnapshot, SyncMeta, WriteMethod,
    WriteOutcome, WriteRequest,
};
