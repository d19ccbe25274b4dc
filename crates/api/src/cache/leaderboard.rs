//! Leaderboard caching with Redis
//!
//! Read-through with TTL-only invalidation: the game-end path never writes
//! here, so a stale top-5 can lag by up to the TTL.

use redis::AsyncCommands;

use mistduel_protocol::api::profile::LeaderboardEntry;

/// Cache key for the top-5 leaderboard.
const LEADERBOARD_KEY: &str = "leaderboard:top5";

/// TTL for the cached leaderboard (5 minutes).
const LEADERBOARD_TTL_SECS: u64 = 300;

/// Leaderboard cache operations
pub struct LeaderboardCache;

impl LeaderboardCache {
    /// Get the cached leaderboard, if present and parseable.
    pub async fn get(client: &redis::Client) -> Option<Vec<LeaderboardEntry>> {
        let mut conn = match client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Failed to connect to Redis for cache read: {}", e);
                return None;
            }
        };

        let data: Option<String> = match conn.get(LEADERBOARD_KEY).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to read leaderboard cache: {}", e);
                return None;
            }
        };

        data.and_then(|json| {
            serde_json::from_str(&json)
                .map_err(|e| tracing::warn!("Failed to deserialize cached leaderboard: {}", e))
                .ok()
        })
    }

    /// Cache the leaderboard for the TTL window.
    pub async fn set(client: &redis::Client, entries: &[LeaderboardEntry]) {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize leaderboard for cache: {}", e);
                return;
            }
        };

        let mut conn = match client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Failed to connect to Redis for cache write: {}", e);
                return;
            }
        };

        if let Err(e) =
            conn.set_ex::<_, _, ()>(LEADERBOARD_KEY, json, LEADERBOARD_TTL_SECS).await
        {
            tracing::warn!("Failed to write leaderboard cache: {}", e);
        }
    }
}
