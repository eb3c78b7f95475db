//! Batched delivery with partial-failure accounting.
//!
//! Recipients are split into bounded batches to respect transport rate
//! limits. Deliveries within a batch run concurrently; batches themselves
//! are serialized, with an optional pause in between. One recipient's
//! failure never aborts the batch.

use std::time::Duration;
use tracing::debug;

use herald_core::{BatchConfig, UserId};

use crate::transport::{OutboundMessage, Transport};

/// Aggregated result of one batched delivery.
#[derive(Debug, Default, Clone)]
pub struct DeliveryOutcome {
    pub success_count: u32,
    pub failed_count: u32,
    pub failed_ids: Vec<UserId>,
    pub errors: Vec<String>,
}

/// Deliver `message` to every recipient through the transport.
pub async fn deliver(
    transport: &dyn Transport,
    message: &OutboundMessage,
    recipients: &[UserId],
    config: &BatchConfig,
) -> DeliveryOutcome {
    let batch_size = config.batch_size.max(1);
    let mut outcome = DeliveryOutcome::default();

    let mut batches = recipients.chunks(batch_size).peekable();
    while let Some(batch) = batches.next() {
        let sends = batch.iter().map(|id| async move {
            let result = transport.send(*id, message).await;
            (*id, result)
        });

        for (id, result) in futures_util::future::join_all(sends).await {
            match result {
                Ok(()) => outcome.success_count += 1,
                Err(failure) => {
                    outcome.failed_count += 1;
                    outcome.failed_ids.push(id);
                    outcome.errors.push(failure.reason);
                }
            }
        }

        debug!(
            batch_len = batch.len(),
            success = outcome.success_count,
            failed = outcome.failed_count,
            "Delivered batch"
        );

        if !config.continue_on_error && outcome.failed_count > 0 {
            break;
        }

        if batches.peek().is_some() && config.delay_between_batches_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.delay_between_batches_ms)).await;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use herald_core::ParseMode;
    use crate::transport::TransportFailure;

    struct RecordingTransport {
        sent: Mutex<Vec<UserId>>,
        failing: HashSet<UserId>,
    }

    impl RecordingTransport {
        fn new(failing: impl IntoIterator<Item = UserId>) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failing: failing.into_iter().collect(),
            }
        }

        fn attempted(&self) -> Vec<UserId> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(
            &self,
            recipient: UserId,
            _message: &OutboundMessage,
        ) -> Result<(), TransportFailure> {
            self.sent.lock().unwrap().push(recipient);
            if self.failing.contains(&recipient) {
                Err(TransportFailure::new(format!("recipient {recipient} unreachable")))
            } else {
                Ok(())
            }
        }
    }

    fn message() -> OutboundMessage {
        OutboundMessage {
            text: "hello".into(),
            buttons: vec![],
            image: None,
            parse_mode: ParseMode::Plain,
        }
    }

    fn no_delay() -> BatchConfig {
        BatchConfig {
            delay_between_batches_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_deliver_all_success() {
        let transport = RecordingTransport::new([]);
        let outcome = deliver(&transport, &message(), &[1, 2, 3], &no_delay()).await;
        assert_eq!(outcome.success_count, 3);
        assert_eq!(outcome.failed_count, 0);
        assert!(outcome.failed_ids.is_empty());
        assert_eq!(transport.attempted().len(), 3);
    }

    #[tokio::test]
    async fn test_deliver_continues_past_failures() {
        let transport = RecordingTransport::new([2]);
        let outcome = deliver(&transport, &message(), &[1, 2, 3], &no_delay()).await;
        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.failed_count, 1);
        assert_eq!(outcome.failed_ids, vec![2]);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(transport.attempted().len(), 3);
    }

    #[tokio::test]
    async fn test_deliver_stops_after_failed_batch_when_configured() {
        let transport = RecordingTransport::new([1]);
        let config = BatchConfig {
            batch_size: 2,
            delay_between_batches_ms: 0,
            continue_on_error: false,
        };
        let outcome = deliver(&transport, &message(), &[1, 2, 3, 4], &config).await;
        // First batch (1, 2) runs; the second is never started
        assert_eq!(transport.attempted().len(), 2);
        assert_eq!(outcome.failed_ids, vec![1]);
        assert_eq!(outcome.success_count, 1);
    }

    #[tokio::test]
    async fn test_deliver_empty_recipient_list() {
        let transport = RecordingTransport::new([]);
        let outcome = deliver(&transport, &message(), &[], &no_delay()).await;
        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.failed_count, 0);
        assert!(transport.attempted().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_paces_batches() {
        let transport = RecordingTransport::new([]);
        let config = BatchConfig {
            batch_size: 2,
            delay_between_batches_ms: 500,
            continue_on_error: true,
        };
        let started = tokio::time::Instant::now();
        let outcome = deliver(&transport, &message(), &[1, 2, 3, 4, 5], &config).await;
        // Two pauses between three batches; no trailing pause
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
        assert_eq!(outcome.success_count, 5);
    }

    #[test]
    fn test_deliver_zero_batch_size_is_clamped() {
        let transport = RecordingTransport::new([]);
        let config = BatchConfig {
            batch_size: 0,
            delay_between_batches_ms: 0,
            continue_on_error: true,
        };
        let outcome =
            tokio_test::block_on(deliver(&transport, &message(), &[1, 2], &config));
        assert_eq!(outcome.success_count, 2);
    }
}
