use crate::domain::event::ServerEvent;
use crate::domain::user::UserId;
use crate::services::registry::SessionRegistry;
use opentelemetry::{
    KeyValue, global,
    metrics::Counter,
};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

/// Canonical key for a direct pair. Sorting the ids makes the key identical
/// no matter which side computes it.
#[must_use]
pub fn direct_group_key(user_a: UserId, user_b: UserId) -> String {
    let (low, high) = if user_a <= user_b { (user_a, user_b) } else { (user_b, user_a) };
    format!("private_chat_{low}_{high}")
}

#[must_use]
pub fn room_group_key(room_id: i64) -> String {
    format!("room_chat_{room_id}")
}

#[derive(Clone, Debug)]
struct Metrics {
    events_total: Counter<u64>,
    dropped_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("parley-server");
        Self {
            events_total: meter
                .u64_counter("parley_broadcast_events_total")
                .with_description("Total events fanned out to broadcast groups")
                .build(),
            dropped_total: meter
                .u64_counter("parley_broadcast_dropped_total")
                .with_description("Events not delivered to a group member")
                .build(),
        }
    }
}

/// Fans events out to every connection joined to a group, the sender's own
/// connections included.
#[derive(Clone, Debug)]
pub struct BroadcastRouter {
    registry: Arc<SessionRegistry>,
    metrics: Metrics,
}

impl BroadcastRouter {
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry, metrics: Metrics::new() }
    }

    /// Delivers the event to a snapshot of the group's members and returns
    /// how many accepted it. Delivery never blocks: a member with a full
    /// outbound buffer drops this event, a member whose session already died
    /// is skipped, and neither interferes with the rest of the group.
    pub fn broadcast(&self, group: &str, event: &ServerEvent) -> usize {
        let members = self.registry.members_of(group);
        let mut delivered = 0;

        for (connection_id, handle) in members {
            match handle.tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(%group, %connection_id, "Outbound buffer full, dropping event");
                    self.metrics.dropped_total.add(1, &[KeyValue::new("reason", "buffer_full")]);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(%group, %connection_id, "Skipping closed connection");
                    self.metrics.dropped_total.add(1, &[KeyValue::new("reason", "closed")]);
                }
            }
        }

        self.metrics.events_total.add(1, &[]);
        tracing::trace!(%group, delivered, "Event broadcast");

        delivered
    }
}
