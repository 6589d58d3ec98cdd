use crate::domain::event::ServerEvent;
use crate::domain::user::UserId;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// A live connection as the registry sees it: who it belongs to and the
/// bounded channel its session drains into the socket.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    pub user_id: UserId,
    pub tx: mpsc::Sender<ServerEvent>,
}

/// Process-local table of live connections, keyed by broadcast group.
/// DashMap locks per entry, so joins, leaves, and membership snapshots for
/// one group serialize while distinct groups proceed independently.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    groups: DashMap<String, HashMap<ConnectionId, ConnectionHandle>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { groups: DashMap::new() }
    }

    pub fn join(&self, group: &str, connection_id: ConnectionId, handle: ConnectionHandle) {
        self.groups.entry(group.to_owned()).or_default().insert(connection_id, handle);
        tracing::debug!(%group, %connection_id, "Connection joined group");
    }

    /// Removes the connection from the group, pruning the group once empty.
    pub fn leave(&self, group: &str, connection_id: ConnectionId) {
        if let Some(mut members) = self.groups.get_mut(group) {
            members.remove(&connection_id);
            let empty = members.is_empty();
            drop(members);
            if empty {
                self.groups.remove_if(group, |_, members| members.is_empty());
            }
        }
        tracing::debug!(%group, %connection_id, "Connection left group");
    }

    /// A consistent snapshot of the group's membership at call time.
    /// Connections joining afterwards are not part of it.
    #[must_use]
    pub fn members_of(&self, group: &str) -> Vec<(ConnectionId, ConnectionHandle)> {
        self.groups
            .get(group)
            .map(|members| members.iter().map(|(id, handle)| (*id, handle.clone())).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn handle(user_id: UserId) -> (ConnectionHandle, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectionHandle { user_id, tx }, rx)
    }

    #[test]
    fn join_and_leave_round_trip() {
        let registry = SessionRegistry::new();
        let conn = Uuid::new_v4();
        let (h, _rx) = handle(1);

        registry.join("private_chat_1_2", conn, h);
        assert_eq!(registry.members_of("private_chat_1_2").len(), 1);

        registry.leave("private_chat_1_2", conn);
        assert!(registry.members_of("private_chat_1_2").is_empty());
        assert_eq!(registry.group_count(), 0, "Empty group should be pruned");
    }

    #[test]
    fn members_of_unknown_group_is_empty() {
        let registry = SessionRegistry::new();
        assert!(registry.members_of("private_chat_9_9").is_empty());
    }

    #[test]
    fn leave_leaves_other_members_in_place() {
        let registry = SessionRegistry::new();
        let (conn_a, conn_b) = (Uuid::new_v4(), Uuid::new_v4());
        let (ha, _rxa) = handle(1);
        let (hb, _rxb) = handle(2);

        registry.join("room_chat_5", conn_a, ha);
        registry.join("room_chat_5", conn_b, hb);
        registry.leave("room_chat_5", conn_a);

        let members = registry.members_of("room_chat_5");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].0, conn_b);
    }

    #[tokio::test]
    async fn concurrent_joins_lose_no_entries() {
        let registry = Arc::new(SessionRegistry::new());

        let mut tasks = Vec::new();
        for i in 0..64 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let (h, rx) = handle(i);
                registry.join("room_chat_1", Uuid::new_v4(), h);
                // Keep the receiver alive until the join is observable.
                drop(rx);
            }));
        }
        for task in tasks {
            task.await.expect("join task");
        }

        assert_eq!(registry.members_of("room_chat_1").len(), 64);
    }
}
