//! Session registry
//!
//! Tracks the open connections of one lobby: an ordered player roster and a
//! separate spectator pool. A `ConnHandle` is the sending half of the
//! per-socket channel that feeds the socket's writer task; fan-out is
//! best-effort and never blocks the owning actor - a full or closed channel
//! is logged and skipped.
//!
//! Only the owning lobby actor touches a `Roster`, so events reach every
//! connection in exactly the order the state machine produced them.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use mistduel_protocol::socket::ServerEvent;

/// Outbound buffer per connection. A client that stops draining this many
/// events is effectively gone; further sends to it are dropped.
const CONNECTION_BUFFER: usize = 64;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Sender side of one socket's outbound channel.
#[derive(Debug, Clone)]
pub struct ConnHandle {
    id: u64,
    tx: mpsc::Sender<ServerEvent>,
}

/// Create the channel pair for a new connection. The receiver belongs to the
/// socket's writer task.
pub fn connection_channel() -> (ConnHandle, mpsc::Receiver<ServerEvent>) {
    let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
    let id = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
    (ConnHandle { id, tx }, rx)
}

impl ConnHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Best-effort send; failures are logged, never raised.
    pub fn send(&self, event: ServerEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::debug!(conn_id = self.id, error = %e, "Dropped outbound event");
        }
    }
}

/// Per-lobby connection registry.
#[derive(Debug, Default)]
pub struct Roster {
    players: Vec<(String, ConnHandle)>,
    spectators: Vec<ConnHandle>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a player connection.
    pub fn attach(&mut self, user_id: &str, conn: ConnHandle) {
        self.players.push((user_id.to_string(), conn));
    }

    /// Remove one specific player connection.
    pub fn detach(&mut self, conn_id: u64) {
        self.players.retain(|(_, conn)| conn.id() != conn_id);
    }

    /// Remove every connection belonging to `user_id`.
    pub fn detach_user(&mut self, user_id: &str) {
        self.players.retain(|(id, _)| id != user_id);
    }

    /// Atomically replace any stale connections of `user_id` with `conn`.
    pub fn rebind(&mut self, user_id: &str, conn: ConnHandle) {
        self.detach_user(user_id);
        self.players.push((user_id.to_string(), conn));
    }

    pub fn has_user(&self, user_id: &str) -> bool {
        self.players.iter().any(|(id, _)| id == user_id)
    }

    pub fn has_conn(&self, conn_id: u64) -> bool {
        self.players.iter().any(|(_, conn)| conn.id() == conn_id)
    }

    /// Attached player ids, in attach order, deduplicated.
    pub fn user_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for (id, _) in &self.players {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    pub fn players_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn spectator_attach(&mut self, conn: ConnHandle) {
        self.spectators.push(conn);
    }

    pub fn spectator_detach(&mut self, conn_id: u64) {
        self.spectators.retain(|conn| conn.id() != conn_id);
    }

    /// Fan an event out to all players and spectators.
    pub fn broadcast(&self, event: &ServerEvent) {
        for (_, conn) in &self.players {
            conn.send(event.clone());
        }
        self.broadcast_spectators(event);
    }

    /// Fan an event out to everyone except `user_id`'s connections.
    pub fn broadcast_except(&self, user_id: &str, event: &ServerEvent) {
        for (id, conn) in &self.players {
            if id != user_id {
                conn.send(event.clone());
            }
        }
        self.broadcast_spectators(event);
    }

    pub fn broadcast_spectators(&self, event: &ServerEvent) {
        for conn in &self.spectators {
            conn.send(event.clone());
        }
    }

    /// Send to every connection of one user.
    pub fn send_to_user(&self, user_id: &str, event: &ServerEvent) {
        for (id, conn) in &self.players {
            if id == user_id {
                conn.send(event.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> ServerEvent {
        ServerEvent::PlayerGuessed { player: "usr_a".into() }
    }

    #[test]
    fn test_attach_detach_by_connection_identity() {
        let (conn_a, _rx_a) = connection_channel();
        let (conn_b, _rx_b) = connection_channel();
        let a_id = conn_a.id();

        let mut roster = Roster::new();
        roster.attach("usr_a", conn_a);
        roster.attach("usr_b", conn_b);
        assert_eq!(roster.user_ids(), vec!["usr_a", "usr_b"]);

        roster.detach(a_id);
        assert!(!roster.has_user("usr_a"));
        assert!(roster.has_user("usr_b"));
    }

    #[test]
    fn test_rebind_replaces_stale_connections() {
        let (stale, _rx1) = connection_channel();
        let (fresh, mut rx2) = connection_channel();

        let mut roster = Roster::new();
        roster.attach("usr_a", stale);
        roster.rebind("usr_a", fresh);

        assert_eq!(roster.user_ids(), vec!["usr_a"]);
        roster.send_to_user("usr_a", &event());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_reaches_players_and_spectators() {
        let (player, mut player_rx) = connection_channel();
        let (spectator, mut spectator_rx) = connection_channel();

        let mut roster = Roster::new();
        roster.attach("usr_a", player);
        roster.spectator_attach(spectator);

        roster.broadcast(&event());
        assert!(player_rx.try_recv().is_ok());
        assert!(spectator_rx.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_except_skips_the_named_user() {
        let (conn_a, mut rx_a) = connection_channel();
        let (conn_b, mut rx_b) = connection_channel();

        let mut roster = Roster::new();
        roster.attach("usr_a", conn_a);
        roster.attach("usr_b", conn_b);

        roster.broadcast_except("usr_a", &event());
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_send_to_closed_connection_does_not_panic() {
        let (conn, rx) = connection_channel();
        drop(rx);

        let mut roster = Roster::new();
        roster.attach("usr_a", conn);
        roster.broadcast(&event());
    }
}
