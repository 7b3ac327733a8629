//! Live push connections and group fan-out.

use super::registry::{GroupKey, SubscriptionRegistry};
use crate::metrics::PushMetrics;
use parking_lot::RwLock;
use qanda_core::{ConnectionId, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

/// Event names used on the push channel.
pub mod events {
    /// Informational text for the connection.
    pub const MESSAGE: &str = "Message";
    /// Current state of a followed question.
    pub const RECEIVE_QUESTION: &str = "ReceiveQuestion";
    /// Rejected client message.
    pub const ERROR: &str = "Error";
}

/// One server-to-client push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub event: String,
    pub payload: serde_json::Value,
}

impl PushMessage {
    /// Creates a push for `event`.
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    /// Informational text message.
    pub fn message(text: impl Into<String>) -> Self {
        Self::new(events::MESSAGE, serde_json::Value::String(text.into()))
    }

    /// Error text message.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(events::ERROR, serde_json::Value::String(text.into()))
    }
}

/// Outcome of one group send.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections the push was queued for.
    pub delivered: usize,
    /// Connections whose queue was full; the push was skipped for them.
    pub dropped: usize,
    /// Connections found closed and removed.
    pub pruned: usize,
}

/// Server-to-client delivery addressed by group.
pub trait PushChannel: Send + Sync {
    /// Queues `event` with `payload` for every current member of `group`.
    ///
    /// Never fails as a whole: unreachable members are counted in the report.
    fn send_to_group(&self, group: GroupKey, event: &str, payload: &serde_json::Value) -> DeliveryReport;
}

/// Registry of live connections and their outbound queues.
///
/// Each connection gets a bounded queue; its socket task drains the receiver
/// returned by [`ConnectionHub::connect`]. Group membership lives in the
/// embedded [`SubscriptionRegistry`].
pub struct ConnectionHub {
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<PushMessage>>>,
    registry: SubscriptionRegistry,
    outbound_buffer: usize,
}

impl ConnectionHub {
    /// Creates a hub whose per-connection queues hold `outbound_buffer` pushes.
    #[must_use]
    pub fn new(outbound_buffer: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            registry: SubscriptionRegistry::new(),
            outbound_buffer: outbound_buffer.max(1),
        }
    }

    /// Registers a new connection.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<PushMessage>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        let count = {
            let mut connections = self.connections.write();
            connections.insert(id, tx);
            connections.len()
        };
        PushMetrics::connections(count);
        info!(connection_id = %id, connections = count, "Push connection opened");
        (id, rx)
    }

    /// Forgets a connection and every group it joined.
    ///
    /// Safe to call more than once; returns whether the connection was known.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let (known, count) = {
            let mut connections = self.connections.write();
            let known = connections.remove(&id).is_some();
            (known, connections.len())
        };
        let left = self.registry.remove_connection(id);
        if known {
            PushMetrics::connections(count);
            info!(connection_id = %id, groups_left = left, connections = count, "Push connection closed");
        }
        known
    }

    /// Adds a live connection to the group for `question`.
    ///
    /// Returns `false` when the connection is not registered.
    pub fn subscribe(&self, id: ConnectionId, question: QuestionId) -> bool {
        // Holding the read lock keeps a concurrent disconnect from slipping
        // between the liveness check and the join.
        let connections = self.connections.read();
        if !connections.contains_key(&id) {
            return false;
        }
        self.registry.join(question, id);
        debug!(connection_id = %id, question_id = %question, "Subscribed");
        true
    }

    /// Removes a connection from the group for `question`.
    pub fn unsubscribe(&self, id: ConnectionId, question: QuestionId) -> bool {
        let left = self.registry.leave(question, id);
        debug!(connection_id = %id, question_id = %question, "Unsubscribed");
        left
    }

    /// Number of open connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// The subscription registry backing this hub.
    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }
}

impl PushChannel for ConnectionHub {
    fn send_to_group(&self, group: GroupKey, event: &str, payload: &serde_json::Value) -> DeliveryReport {
        let members = self.registry.members(group.question_id());
        if members.is_empty() {
            return DeliveryReport::default();
        }

        let message = PushMessage::new(event, payload.clone());
        let mut report = DeliveryReport::default();
        let mut closed = Vec::new();
        {
            let connections = self.connections.read();
            for id in members {
                let Some(sender) = connections.get(&id) else {
                    closed.push(id);
                    continue;
                };
                match sender.try_send(message.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(connection_id = %id, group = %group, event, "Outbound queue full; push dropped");
                        report.dropped += 1;
                    }
                    Err(TrySendError::Closed(_)) => closed.push(id),
                }
            }
        }

        for id in closed {
            self.disconnect(id);
            report.pruned += 1;
        }

        if report.delivered > 0 {
            PushMetrics::delivered(event, report.delivered);
        }
        if report.dropped > 0 {
            PushMetrics::dropped(event, "queue_full", report.dropped);
        }
        if report.pruned > 0 {
            PushMetrics::dropped(event, "closed", report.pruned);
        }
        report
    }
}

impl std::fmt::Debug for ConnectionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHub")
            .field("connections", &self.connection_count())
            .field("registry", &self.registry)
            .field("outbound_buffer", &self.outbound_buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group(id: i64) -> GroupKey {
        GroupKey::question(QuestionId(id))
    }

    #[test]
    fn test_push_message_wire_shape() {
        let text = serde_json::to_string(&PushMessage::message("Successfully connected")).unwrap();
        assert_eq!(text, r#"{"event":"Message","payload":"Successfully connected"}"#);
    }

    #[tokio::test]
    async fn test_send_reaches_members_only() {
        let hub = ConnectionHub::new(8);
        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        let (_c, mut rx_c) = hub.connect();
        hub.subscribe(a, QuestionId(5));
        hub.subscribe(b, QuestionId(5));

        let report = hub.send_to_group(group(5), events::RECEIVE_QUESTION, &json!({"questionId": 5}));
        assert_eq!(report.delivered, 2);

        for rx in [&mut rx_a, &mut rx_b] {
            let message = rx.try_recv().unwrap();
            assert_eq!(message.event, "ReceiveQuestion");
            assert_eq!(message.payload["questionId"], 5);
            assert!(rx.try_recv().is_err());
        }
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_queue_drops_for_that_connection_only() {
        let hub = ConnectionHub::new(1);
        let (slow, _rx_slow) = hub.connect();
        let (fast, mut rx_fast) = hub.connect();
        hub.subscribe(slow, QuestionId(1));
        hub.subscribe(fast, QuestionId(1));

        let first = hub.send_to_group(group(1), "E", &json!(1));
        assert_eq!(first.delivered, 2);
        rx_fast.try_recv().unwrap();

        let second = hub.send_to_group(group(1), "E", &json!(2));
        assert_eq!(second.delivered, 1);
        assert_eq!(second.dropped, 1);
        assert_eq!(rx_fast.try_recv().unwrap().payload, json!(2));
        assert!(hub.registry().members(QuestionId(1)).contains(&slow));
    }

    #[tokio::test]
    async fn test_closed_receiver_is_pruned() {
        let hub = ConnectionHub::new(4);
        let (gone, rx_gone) = hub.connect();
        hub.subscribe(gone, QuestionId(3));
        drop(rx_gone);

        let report = hub.send_to_group(group(3), "E", &json!(null));
        assert_eq!(report.pruned, 1);
        assert_eq!(report.delivered, 0);
        assert!(hub.registry().members(QuestionId(3)).is_empty());
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_without_leave_clears_membership() {
        let hub = ConnectionHub::new(4);
        let (a, _rx) = hub.connect();
        hub.subscribe(a, QuestionId(5));
        assert!(hub.registry().members(QuestionId(5)).contains(&a));

        assert!(hub.disconnect(a));
        assert!(!hub.registry().members(QuestionId(5)).contains(&a));
        assert!(!hub.disconnect(a));
    }

    #[tokio::test]
    async fn test_subscribe_requires_live_connection() {
        let hub = ConnectionHub::new(4);
        let (a, _rx) = hub.connect();
        hub.disconnect(a);
        assert!(!hub.subscribe(a, QuestionId(1)));
        assert_eq!(hub.registry().group_count(), 0);
    }

    #[test]
    fn test_disconnect_ends_outbound_stream() {
        let hub = ConnectionHub::new(4);
        let (a, mut rx) = hub.connect();
        hub.subscribe(a, QuestionId(2));
        hub.send_to_group(group(2), "E", &json!("last"));
        hub.disconnect(a);

        let last = tokio_test::block_on(rx.recv()).unwrap();
        assert_eq!(last.payload, json!("last"));
        assert!(tokio_test::block_on(rx.recv()).is_none());
    }
}
