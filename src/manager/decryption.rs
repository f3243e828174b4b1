use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

use crate::client::{MatrixClient, MatrixEvent};

/// Which pass through the decryption gate an event is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptionAttempt {
    First,
    Retry,
}

impl DecryptionAttempt {
    pub fn is_retry(self) -> bool {
        self == DecryptionAttempt::Retry
    }
}

/// Makes sure timeline events are decrypted before anyone inspects them
///
/// A failed decryption is retried exactly once after a fixed delay by calling
/// back into the caller's pipeline. A second failure drops the event. Nothing
/// is surfaced to callers beyond the log.
pub(crate) struct DecryptionGate {
    client: Arc<dyn MatrixClient>,
    retry_delay: Duration,
}

impl DecryptionGate {
    pub fn new(client: Arc<dyn MatrixClient>, retry_delay: Duration) -> Self {
        Self {
            client,
            retry_delay,
        }
    }

    /// Returns the clear event, or `None` if it could not be decrypted
    ///
    /// On a first-attempt failure `retry` is scheduled to receive the
    /// original event after the retry delay.
    pub async fn decrypt<F>(
        &self,
        event: MatrixEvent,
        attempt: DecryptionAttempt,
        retry: F,
    ) -> Option<MatrixEvent>
    where
        F: FnOnce(MatrixEvent) -> BoxFuture<'static, ()> + Send + 'static,
    {
        match self.client.decrypt_event_if_needed(&event).await {
            Ok(clear) => {
                if attempt.is_retry() {
                    info!(event_id = %event.event_id, "Decryption succeeded for event after retry");
                }
                Some(clear)
            }
            Err(error) if !attempt.is_retry() => {
                warn!(
                    event_id = %event.event_id,
                    reason = error.reason(),
                    error = %error,
                    retry_in_ms = self.retry_delay.as_millis() as u64,
                    "Decryption failed for event, will retry once only"
                );
                self.schedule_retry(event, retry);
                None
            }
            Err(error) => {
                warn!(
                    event_id = %event.event_id,
                    reason = error.reason(),
                    error = %error,
                    "Decryption failed for event after retry, giving up"
                );
                None
            }
        }
    }

    // No cancellation: a retry outlives stop() and the callback decides what to do
    fn schedule_retry<F>(&self, event: MatrixEvent, retry: F) -> JoinHandle<()>
    where
        F: FnOnce(MatrixEvent) -> BoxFuture<'static, ()> + Send + 'static,
    {
        let delay = self.retry_delay;
        tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                retry(event).await;
            }
            .in_current_span(),
        )
    }
}
