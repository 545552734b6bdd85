use dashmap::DashMap;
use std::collections::HashSet;
use uuid::Uuid;

/// Tracks which users currently hold at least one live connection.
///
/// The map is owned here; connection handlers call `connect`/`disconnect`
/// and readers get point-in-time answers without any external locking.
#[derive(Default)]
pub struct PresenceTracker {
    connections: DashMap<Uuid, HashSet<String>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, user_id: Uuid, connection_id: &str) {
        self.connections
            .entry(user_id)
            .or_default()
            .insert(connection_id.to_string());
        tracing::debug!(%user_id, connection_id, "presence connect");
    }

    pub fn disconnect(&self, user_id: Uuid, connection_id: &str) {
        let now_offline = if let Some(mut entry) = self.connections.get_mut(&user_id) {
            entry.remove(connection_id);
            entry.is_empty()
        } else {
            false
        };
        // Drop the entry outside of get_mut to avoid holding the shard lock.
        if now_offline {
            self.connections.remove_if(&user_id, |_, conns| conns.is_empty());
        }
        tracing::debug!(%user_id, connection_id, "presence disconnect");
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.connections
            .get(&user_id)
            .map(|c| !c.is_empty())
            .unwrap_or(false)
    }

    pub fn online_user_ids(&self) -> Vec<Uuid> {
        self.connections
            .iter()
            .filter(|e| !e.value().is_empty())
            .map(|e| *e.key())
            .collect()
    }

    pub fn online_count(&self) -> usize {
        self.connections.iter().filter(|e| !e.value().is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn offline_until_first_connection() {
        let tracker = PresenceTracker::new();
        let user = Uuid::new_v4();
        assert!(!tracker.is_online(user));
        tracker.connect(user, "conn-1");
        assert!(tracker.is_online(user));
    }

    #[test]
    fn online_until_last_connection_drops() {
        let tracker = PresenceTracker::new();
        let user = Uuid::new_v4();
        tracker.connect(user, "conn-1");
        tracker.connect(user, "conn-2");
        tracker.disconnect(user, "conn-1");
        assert!(tracker.is_online(user));
        tracker.disconnect(user, "conn-2");
        assert!(!tracker.is_online(user));
        assert!(tracker.online_user_ids().is_empty());
    }

    #[test]
    fn disconnect_of_unknown_user_is_a_noop() {
        let tracker = PresenceTracker::new();
        tracker.disconnect(Uuid::new_v4(), "ghost");
        assert_eq!(tracker.online_count(), 0);
    }

    #[test]
    fn duplicate_connection_ids_collapse() {
        let tracker = PresenceTracker::new();
        let user = Uuid::new_v4();
        tracker.connect(user, "conn-1");
        tracker.connect(user, "conn-1");
        tracker.disconnect(user, "conn-1");
        assert!(!tracker.is_online(user));
    }

    #[test]
    fn concurrent_connect_disconnect() {
        let tracker = Arc::new(PresenceTracker::new());
        let users: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();

        let mut handles = Vec::new();
        for (i, user) in users.iter().copied().enumerate() {
            let tracker = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for round in 0..100 {
                    let conn = format!("conn-{i}-{round}");
                    tracker.connect(user, &conn);
                    if round % 2 == 0 {
                        tracker.disconnect(user, &conn);
                    }
                }
            }));
        }
        for h in handles {
            h.join().expect("worker thread panicked");
        }

        // Every user kept the odd-round connections, so all are online.
        assert_eq!(tracker.online_count(), users.len());
        for user in users {
            assert!(tracker.is_online(user));
        }
    }
}
