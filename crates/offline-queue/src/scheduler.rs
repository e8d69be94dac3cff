//! Connectivity-triggered scheduling for the offline queue.

use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

use crate::queue::OfflineQueue;

/// Default cadence of the periodic safety-net drain.
pub const DEFAULT_PERIODIC_INTERVAL: Duration = Duration::from_secs(20);
/// Default delay before the one-shot startup flush.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(2);

/// Timer configuration for a queue scheduler.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub periodic_interval: Duration,
    pub startup_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            periodic_interval: DEFAULT_PERIODIC_INTERVAL,
            startup_delay: DEFAULT_STARTUP_DELAY,
        }
    }
}

/// Handle to the scheduler's background tasks.
///
/// Three independent triggers funnel into the same idempotent
/// [`OfflineQueue::sync_now`]: a one-shot startup flush for backlog left by a
/// previous session, a periodic timer as a safety net while online, and the
/// offline-to-online connectivity transition. `shutdown` releases all of
/// them.
pub struct SchedulerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn start(queue: OfflineQueue, config: SchedulerConfig) -> Self {
        let mut tasks = Vec::with_capacity(3);

        let startup_queue = queue.clone();
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(config.startup_delay).await;
            let outcome = startup_queue.sync_now().await;
            debug!("startup flush finished: {outcome:?}");
        }));

        let periodic_queue = queue.clone();
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.periodic_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; the startup flush covers it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !periodic_queue.connectivity().is_online() {
                    continue;
                }
                if periodic_queue.status().queued == 0 {
                    continue;
                }
                let outcome = periodic_queue.sync_now().await;
                debug!("periodic drain finished: {outcome:?}");
            }
        }));

        let mut watch = queue.connectivity().watch();
        tasks.push(tokio::spawn(async move {
            let mut was_online = *watch.borrow();
            loop {
                if watch.changed().await.is_err() {
                    break;
                }
                let online = *watch.borrow_and_update();
                if online && !was_online {
                    let outcome = queue.sync_now().await;
                    debug!("connectivity-restored drain finished: {outcome:?}");
                }
                was_online = online;
            }
        }));

        Self { tasks }
    }

    /// Cancel the timers and deregister the connectivity listener.
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}
