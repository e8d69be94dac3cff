//! Shared test doubles for queue and scheduler tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::transport::Transport;
use crate::types::QueuedOperation;

/// One scripted outcome for a delivery attempt.
#[derive(Debug, Clone, Copy)]
pub enum ScriptedOutcome {
    Status(u16),
    NetworkError,
    /// Respond after a delay, to hold a drain pass in flight.
    SlowStatus(u16, Duration),
}

/// Transport that replays a script and records every delivery attempt.
/// An exhausted script answers 200.
pub struct MockTransport {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    attempts: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn scripted(outcomes: Vec<ScriptedOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok() -> Self {
        Self::scripted(Vec::new())
    }

    /// Urls of every attempted delivery, in attempt order.
    pub fn attempted_urls(&self) -> Vec<String> {
        self.attempts.lock().expect("attempts lock").clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn deliver(&self, operation: &QueuedOperation) -> Result<u16, TransportError> {
        self.attempts
            .lock()
            .expect("attempts lock")
            .push(operation.url.clone());
        let outcome = self.script.lock().expect("script lock").pop_front();
        match outcome {
            None => Ok(200),
            Some(ScriptedOutcome::Status(status)) => Ok(status),
            Some(ScriptedOutcome::NetworkError) => {
                Err(TransportError::Network("connection reset".to_string()))
            }
            Some(ScriptedOutcome::SlowStatus(status, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(status)
            }
        }
    }
}
