//! Ephemeral game state in redis
//!
//! Two key families, both scoped to a lobby invite code:
//! - `game:{code}` - JSON snapshot of the full `DuelState`, TTL 3600 s,
//!   refreshed on every mutation. Survives a process restart and carries
//!   reconnects after all sockets dropped.
//! - `disconnect:{code}:{user}` - disconnect mark, TTL 180 s. Its presence
//!   is what the kick task checks after the grace window.

use redis::AsyncCommands;

use mistduel_core::duel::DuelState;
use mistduel_core::duel::rules::DISCONNECT_GRACE_SECS;

/// TTL for cached game snapshots.
const GAME_TTL_SECS: u64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Unparseable snapshot. Callers delete the key and treat the lobby as
    /// having no game.
    #[error("Corrupt snapshot for {code}: {source}")]
    Corrupt {
        code: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Redis-backed snapshot store.
#[derive(Clone)]
pub struct SnapshotStore {
    client: redis::Client,
}

impl SnapshotStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn game_key(code: &str) -> String {
        format!("game:{code}")
    }

    fn disconnect_key(code: &str, user_id: &str) -> String {
        format!("disconnect:{code}:{user_id}")
    }

    /// Save the game snapshot, refreshing its TTL.
    pub async fn save_game(&self, code: &str, state: &DuelState) -> Result<(), SnapshotError> {
        let json = serde_json::to_string(state)
            .map_err(|source| SnapshotError::Corrupt { code: code.to_string(), source })?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(Self::game_key(code), json, GAME_TTL_SECS).await?;
        tracing::debug!(code, "Saved game snapshot");
        Ok(())
    }

    /// Load the game snapshot, if any.
    pub async fn load_game(&self, code: &str) -> Result<Option<DuelState>, SnapshotError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json: Option<String> = conn.get(Self::game_key(code)).await?;

        match json {
            Some(data) => serde_json::from_str(&data)
                .map(Some)
                .map_err(|source| SnapshotError::Corrupt { code: code.to_string(), source }),
            None => Ok(None),
        }
    }

    pub async fn delete_game(&self, code: &str) -> Result<(), SnapshotError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(Self::game_key(code)).await?;
        tracing::debug!(code, "Deleted game snapshot");
        Ok(())
    }

    /// Record that `user_id` dropped mid-game; expires with the grace window.
    pub async fn mark_disconnect(
        &self,
        code: &str,
        user_id: &str,
        now_ms: i64,
    ) -> Result<(), SnapshotError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(Self::disconnect_key(code, user_id), now_ms, DISCONNECT_GRACE_SECS)
            .await?;
        Ok(())
    }

    /// Whether a disconnect mark is still present (no reconnect happened).
    pub async fn disconnect_pending(
        &self,
        code: &str,
        user_id: &str,
    ) -> Result<bool, SnapshotError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let pending: bool = conn.exists(Self::disconnect_key(code, user_id)).await?;
        Ok(pending)
    }

    pub async fn clear_disconnect(&self, code: &str, user_id: &str) -> Result<(), SnapshotError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(Self::disconnect_key(code, user_id)).await?;
        Ok(())
    }
}
