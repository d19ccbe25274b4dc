//! Matchmaking queue
//!
//! A linear queue of waiting players, paired on XP distance. One background
//! loop owns pairing; sockets enqueue and dequeue through serialized entry
//! points, and at most one match decision is in flight per tick.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Duration;

use mistduel_core::duel::rules::{DUEL_TIMER_SECS, LOBBY_LOCATIONS};
use mistduel_db::{DbPool, lobbies, users};
use mistduel_locations::LocationProvider;
use mistduel_protocol::socket::ServerEvent;
use mistduel_protocol::socket::payloads::PlayerInfo;

use crate::registry::ConnHandle;

/// Maximum XP gap between matched players.
const MAX_XP_GAP: i32 = 200;

/// Pairing pass cadence.
const TICK_SECS: u64 = 3;

/// Pause between `match_found` and `redirect`, so clients can show the
/// opponent card first.
const REDIRECT_DELAY_SECS: u64 = 2;

/// One waiting player.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub user_id: String,
    pub conn: ConnHandle,
    pub xp: i32,
}

/// The queue itself; all mutation goes through these methods.
#[derive(Debug, Default)]
pub struct MatchQueue {
    entries: Vec<QueueEntry>,
}

impl MatchQueue {
    /// Add a player, replacing any previous entry of theirs. Returns the
    /// 1-based queue position.
    pub fn enqueue(&mut self, entry: QueueEntry) -> usize {
        self.entries.retain(|e| e.user_id != entry.user_id);
        self.entries.push(entry);
        self.entries.len()
    }

    pub fn remove(&mut self, user_id: &str) {
        self.entries.retain(|e| e.user_id != user_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First pair (scan order) within the XP gap.
    pub fn find_pair(&self) -> Option<(QueueEntry, QueueEntry)> {
        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                if (a.xp - b.xp).abs() <= MAX_XP_GAP {
                    return Some((a.clone(), b.clone()));
                }
            }
        }
        None
    }
}

/// Matchmaker service: the shared queue plus the pairing loop.
#[derive(Clone)]
pub struct Matchmaker {
    queue: Arc<Mutex<MatchQueue>>,
    pool: DbPool,
    provider: Arc<LocationProvider>,
}

impl Matchmaker {
    pub fn new(pool: DbPool, provider: Arc<LocationProvider>) -> Self {
        Self { queue: Arc::new(Mutex::new(MatchQueue::default())), pool, provider }
    }

    /// Enqueue a player and tell them their position.
    pub async fn join_queue(&self, entry: QueueEntry) {
        let conn = entry.conn.clone();
        let user_id = entry.user_id.clone();
        let position = self.queue.lock().await.enqueue(entry);
        conn.send(ServerEvent::QueueJoined { position });
        tracing::info!(user_id, position, "Joined matchmaking queue");
    }

    /// Drop a player from the queue (stop request or socket close).
    pub async fn leave_queue(&self, user_id: &str) {
        self.queue.lock().await.remove(user_id);
        tracing::info!(user_id, "Left matchmaking queue");
    }

    /// Pairing loop; run once as a background task.
    pub async fn run(self) {
        loop {
            tokio::time::sleep(Duration::from_secs(TICK_SECS)).await;
            self.tick().await;
        }
    }

    /// One pairing pass: at most one match per tick.
    async fn tick(&self) {
        let pair = self.queue.lock().await.find_pair();
        let Some((a, b)) = pair else { return };

        match self.create_match(&a, &b).await {
            Ok(code) => {
                let mut queue = self.queue.lock().await;
                queue.remove(&a.user_id);
                queue.remove(&b.user_id);
                tracing::info!(
                    code,
                    user_1 = %a.user_id,
                    user_2 = %b.user_id,
                    "Match created"
                );
            }
            Err(e) => {
                tracing::error!(user_1 = %a.user_id, user_2 = %b.user_id, error = %e, "Match failed");
            }
        }
    }

    /// Create the lobby and walk both players through found -> redirect.
    async fn create_match(&self, a: &QueueEntry, b: &QueueEntry) -> Result<String, MatchError> {
        let locations = self.provider.random_locations(LOBBY_LOCATIONS).await?;
        let lobby = lobbies::create(
            &self.pool,
            &a.user_id,
            locations,
            DUEL_TIMER_SECS as i32,
            None,
            None,
        )
        .await?;
        lobbies::add_user(&self.pool, &lobby.invite_code, &b.user_id).await?;

        let profile_a = self.profile(&a.user_id).await?;
        let profile_b = self.profile(&b.user_id).await?;

        a.conn.send(ServerEvent::MatchFound {
            lobby_code: lobby.invite_code.clone(),
            opponent: profile_b,
        });
        b.conn.send(ServerEvent::MatchFound {
            lobby_code: lobby.invite_code.clone(),
            opponent: profile_a,
        });

        tokio::time::sleep(Duration::from_secs(REDIRECT_DELAY_SECS)).await;

        a.conn.send(ServerEvent::Redirect { lobby_code: lobby.invite_code.clone() });
        b.conn.send(ServerEvent::Redirect { lobby_code: lobby.invite_code.clone() });

        Ok(lobby.invite_code)
    }

    async fn profile(&self, user_id: &str) -> Result<PlayerInfo, MatchError> {
        let user = users::get_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| MatchError::UserMissing(user_id.to_string()))?;
        Ok(PlayerInfo {
            user_id: user.id,
            name: user.name,
            avatar: user.avatar,
            xp: user.xp,
            rank: user.rank,
        })
    }
}

#[derive(Debug, thiserror::Error)]
enum MatchError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Location provider error: {0}")]
    Locations(#[from] mistduel_locations::LocationError),

    #[error("Queued user {0} no longer exists")]
    UserMissing(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::connection_channel;

    fn entry(user_id: &str, xp: i32) -> QueueEntry {
        let (conn, _rx) = connection_channel();
        QueueEntry { user_id: user_id.into(), conn, xp }
    }

    #[test]
    fn test_first_pair_within_gap_wins() {
        let mut queue = MatchQueue::default();
        queue.enqueue(entry("usr_1", 800));
        queue.enqueue(entry("usr_2", 1005));
        queue.enqueue(entry("usr_3", 900));

        let (a, b) = queue.find_pair().expect("pair expected");
        assert_eq!(a.user_id, "usr_1");
        assert_eq!(b.user_id, "usr_3");
    }

    #[test]
    fn test_no_pair_outside_gap() {
        let mut queue = MatchQueue::default();
        queue.enqueue(entry("usr_1", 0));
        queue.enqueue(entry("usr_2", 500));
        assert!(queue.find_pair().is_none());
    }

    #[test]
    fn test_gap_boundary_is_inclusive() {
        let mut queue = MatchQueue::default();
        queue.enqueue(entry("usr_1", 100));
        queue.enqueue(entry("usr_2", 300));
        assert!(queue.find_pair().is_some());
    }

    #[test]
    fn test_requeue_replaces_older_entry() {
        let mut queue = MatchQueue::default();
        queue.enqueue(entry("usr_1", 100));
        queue.enqueue(entry("usr_2", 5000));
        let position = queue.enqueue(entry("usr_1", 150));

        assert_eq!(queue.len(), 2);
        assert_eq!(position, 2);

        // A user never pairs with themselves, even after a requeue.
        assert!(queue.find_pair().is_none());
    }

    #[test]
    fn test_remove_clears_the_entry() {
        let mut queue = MatchQueue::default();
        queue.enqueue(entry("usr_1", 100));
        queue.remove("usr_1");
        assert!(queue.is_empty());
    }
}
