//! Connection bookkeeping and broadcast fan-out.
//!
//! Each WebSocket task owns an outbox channel (messages funneled to the
//! socket sink, as in the dispatch loop in [`crate::ws`]). When a connection
//! joins a session, its outbox sender is registered here under a fresh
//! connection id; the event router then broadcasts by session, either to all
//! bound connections or to all except the originator.
//!
//! Delivery is fire-and-forget via `try_send`: a peer whose outbox is full or
//! closed is skipped, never awaited, so one slow consumer cannot hold up the
//! rest of the session.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Tracks which live connections are bound to which session.
///
/// Cloneable — clones share the same peer map. Constructed in `main` and
/// injected through `AppState`.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    peers: Arc<RwLock<HashMap<String, HashMap<Uuid, mpsc::Sender<Value>>>>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection's outbox to a session. Returns the connection id
    /// used to address it in broadcast exclusions and `unbind`.
    pub async fn bind(&self, session_id: &str, outbox: mpsc::Sender<Value>) -> Uuid {
        let conn_id = Uuid::new_v4();
        let mut peers = self.peers.write().await;
        peers
            .entry(session_id.to_string())
            .or_default()
            .insert(conn_id, outbox);
        conn_id
    }

    /// Remove a connection binding. Empty peer sets are dropped so the map
    /// does not grow with dead sessions' transport state.
    pub async fn unbind(&self, session_id: &str, conn_id: Uuid) {
        let mut peers = self.peers.write().await;
        if let Some(set) = peers.get_mut(session_id) {
            set.remove(&conn_id);
            if set.is_empty() {
                peers.remove(session_id);
            }
        }
    }

    /// Deliver `event` to every connection bound to `session_id`, skipping
    /// `exclude` when given. Returns how many peers the event was handed to.
    pub async fn broadcast(
        &self,
        session_id: &str,
        exclude: Option<Uuid>,
        event: &Value,
    ) -> usize {
        let peers = self.peers.read().await;
        let Some(set) = peers.get(session_id) else {
            return 0;
        };
        let mut delivered = 0;
        for (conn_id, outbox) in set {
            if Some(*conn_id) == exclude {
                continue;
            }
            // Fire-and-forget: full or closed outboxes are skipped.
            if outbox.try_send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!("Dropped event for connection {conn_id} in session {session_id}");
            }
        }
        delivered
    }

    /// Number of connections currently bound to a session.
    pub async fn peer_count(&self, session_id: &str) -> usize {
        self.peers
            .read()
            .await
            .get(session_id)
            .map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_broadcast_reaches_all_peers() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        registry.bind("s1", tx_a).await;
        registry.bind("s1", tx_b).await;

        let delivered = registry.broadcast("s1", None, &json!({"type": "x"})).await;
        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_excludes_the_originator() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        let conn_a = registry.bind("s1", tx_a).await;
        registry.bind("s1", tx_b).await;

        let delivered = registry
            .broadcast("s1", Some(conn_a), &json!({"type": "x"}))
            .await;
        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_is_scoped_to_the_session() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        registry.bind("s1", tx_a).await;
        registry.bind("s2", tx_b).await;

        registry.broadcast("s1", None, &json!({"type": "x"})).await;
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
        assert_eq!(registry.broadcast("s3", None, &json!({})).await, 0);
    }

    #[tokio::test]
    async fn test_unbind_removes_the_peer() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        let conn = registry.bind("s1", tx).await;
        assert_eq!(registry.peer_count("s1").await, 1);

        registry.unbind("s1", conn).await;
        assert_eq!(registry.peer_count("s1").await, 0);
        registry.broadcast("s1", None, &json!({"type": "x"})).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_outbox_never_blocks_other_peers() {
        let registry = ConnectionRegistry::new();
        let (tx_slow, _rx_slow) = mpsc::channel(1);
        let (tx_ok, mut rx_ok) = mpsc::channel(8);
        registry.bind("s1", tx_slow.clone()).await;
        registry.bind("s1", tx_ok).await;

        // Saturate the slow peer's outbox.
        tx_slow.try_send(json!({"type": "filler"})).unwrap();

        let delivered = registry.broadcast("s1", None, &json!({"type": "x"})).await;
        assert_eq!(delivered, 1);
        assert!(rx_ok.try_recv().is_ok());
    }
}
