//! Network-reachability signal shared by the queue and its scheduler.

use tokio::sync::watch;

/// Cloneable handle to the device's online/offline state.
///
/// The embedding app flips the flag from whatever reachability signal it has
/// (browser events, OS callbacks, a probe); the queue and scheduler only
/// read it or wait on transitions.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: watch::Sender<bool>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }

    /// Receiver that wakes on every state change.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflects_flag_changes() {
        let connectivity = Connectivity::new(false);
        assert!(!connectivity.is_online());
        connectivity.set_online(true);
        assert!(connectivity.is_online());
    }

    #[tokio::test]
    async fn watch_wakes_on_restore() {
        let connectivity = Connectivity::new(false);
        let mut rx = connectivity.watch();
        connectivity.set_online(true);
        rx.changed().await.expect("sender alive");
        assert!(*rx.borrow());
    }

    #[test]
    fn redundant_sets_do_not_notify() {
        let connectivity = Connectivity::new(true);
        let mut rx = connectivity.watch();
        connectivity.set_online(true);
        assert!(!rx.has_changed().expect("sender alive"));
    }
}
