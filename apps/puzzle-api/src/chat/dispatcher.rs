//! Fan-out of chat messages to every registered session.

use std::sync::Arc;

use futures_util::future::join_all;

use super::registry::ConnectionRegistry;

/// Prefix prepended to every broadcast message.
pub const MESSAGE_PREFIX: &str = "[user]: ";

/// Command that makes the server close the sender's connection.
pub const BYE_COMMAND: &str = "bye";

pub fn format_message(text: &str) -> String {
    format!("{MESSAGE_PREFIX}{text}")
}

pub fn is_bye(text: &str) -> bool {
    text.eq_ignore_ascii_case(BYE_COMMAND)
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Pushes formatted messages to every session in a registry snapshot.
#[derive(Clone)]
pub struct BroadcastDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Broadcast `text` to all sessions, the sender included.
    ///
    /// Deliveries run concurrently and independently. A failed sink is
    /// logged and skipped; nothing is retried.
    pub async fn dispatch(&self, sender_id: &str, text: &str) -> DispatchReport {
        let payload = format_message(text);
        let targets = self.registry.snapshot();

        let results = join_all(targets.iter().map(|(session_id, sink)| {
            let payload = payload.clone();
            async move { (session_id, sink.send_text(payload).await) }
        }))
        .await;

        let mut report = DispatchReport::default();
        for (session_id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        sender_id = %sender_id,
                        session_id = %session_id,
                        error = %err,
                        "chat delivery failed"
                    );
                }
            }
        }

        tracing::debug!(
            sender_id = %sender_id,
            delivered = report.delivered,
            failed = report.failed,
            "chat message dispatched"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::registry::SharedSink;
    use crate::chat::testing::RecordingSink;
    use crate::chat::sink::ChatSink;

    #[test]
    fn bye_matches_any_case() {
        assert!(is_bye("bye"));
        assert!(is_bye("BYE"));
        assert!(is_bye("ByE"));
        assert!(!is_bye("bye!"));
        assert!(!is_bye(" bye"));
    }

    #[tokio::test]
    async fn fans_out_to_every_session_including_sender() {
        let registry = Arc::new(ConnectionRegistry::new());
        let sinks: Vec<Arc<RecordingSink>> = (0..3).map(|_| Arc::new(RecordingSink::new())).collect();
        for (id, sink) in ["a", "b", "c"].iter().zip(&sinks) {
            registry.join(id.to_string(), Arc::clone(sink) as SharedSink).unwrap();
        }

        let dispatcher = BroadcastDispatcher::new(registry);
        let report = dispatcher.dispatch("a", "hi").await;

        assert_eq!(report, DispatchReport { delivered: 3, failed: 0 });
        for sink in &sinks {
            assert_eq!(sink.texts(), vec!["[user]: hi".to_string()]);
        }
    }

    #[tokio::test]
    async fn failed_sink_does_not_stop_others() {
        let registry = Arc::new(ConnectionRegistry::new());
        let healthy = Arc::new(RecordingSink::new());
        registry.join("a".into(), Arc::new(RecordingSink::broken())).unwrap();
        registry.join("b".into(), Arc::clone(&healthy) as SharedSink).unwrap();

        let report = BroadcastDispatcher::new(registry).dispatch("b", "still here").await;

        assert_eq!(report, DispatchReport { delivered: 1, failed: 1 });
        assert_eq!(healthy.texts(), vec!["[user]: still here".to_string()]);
    }

    #[tokio::test]
    async fn full_queue_counts_as_failed_delivery() {
        use crate::chat::sink::ChannelSink;

        let registry = Arc::new(ConnectionRegistry::new());
        let (stalled, _stalled_rx) = ChannelSink::channel(1);
        stalled.send_text("backlog".into()).await.unwrap();
        registry.join("stalled".into(), Arc::new(stalled)).unwrap();
        let healthy = Arc::new(RecordingSink::new());
        registry.join("healthy".into(), Arc::clone(&healthy) as SharedSink).unwrap();

        let report = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            BroadcastDispatcher::new(registry).dispatch("healthy", "ping"),
        )
        .await
        .expect("dispatch waited on a stalled peer");

        assert_eq!(report, DispatchReport { delivered: 1, failed: 1 });
        assert_eq!(healthy.texts(), vec!["[user]: ping".to_string()]);
    }

    #[tokio::test]
    async fn empty_registry_delivers_nothing() {
        let registry = Arc::new(ConnectionRegistry::new());
        let report = BroadcastDispatcher::new(registry).dispatch("ghost", "hello?").await;
        assert_eq!(report, DispatchReport::default());
    }
}
