//! User database queries

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use mistduel_core::rank::rank_for_xp;

use crate::DbPool;

/// Close/far guess counters for one country.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryStat {
    pub close: u32,
    pub far: u32,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String, // usr_XXXXXXXXXXXX
    pub name: String,
    pub avatar: String,
    pub xp: i32,
    pub rank: String,
    pub role: String, // 'user' or 'admin'
    pub clan_id: Option<String>,
    pub country_stats: Json<HashMap<String, CountryStat>>,
    pub ban_reason: Option<String>,
    pub banned_until: Option<DateTime<Utc>>,
}

impl User {
    /// Whether a ban currently applies. A ban with no expiry is permanent.
    pub fn is_banned(&self, now: DateTime<Utc>) -> bool {
        self.ban_reason.is_some() && self.banned_until.is_none_or(|until| until > now)
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// One leaderboard entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub xp: i32,
    pub rank: String,
}

/// A rank change produced by a reward pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankUp {
    pub user_id: String,
    pub old_rank: String,
    pub new_rank: String,
}

pub async fn get_by_id(pool: &DbPool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, avatar, xp, rank, role, clan_id, country_stats,
               ban_reason, banned_until
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_many(pool: &DbPool, user_ids: &[String]) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, avatar, xp, rank, role, clan_id, country_stats,
               ban_reason, banned_until
        FROM users
        WHERE id = ANY($1)
        "#,
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await
}

/// Top five players by XP.
pub async fn leaderboard_top5(pool: &DbPool) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT id, name, avatar, xp, rank
        FROM users
        ORDER BY xp DESC, id ASC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Apply end-of-game XP rewards and recompute ranks in one transaction:
/// every participant +10, the winner +50 on top. Returns the rank changes.
pub async fn apply_game_rewards(
    pool: &DbPool,
    participants: &[String],
    winner: Option<&str>,
) -> Result<Vec<RankUp>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut rank_ups = Vec::new();

    for user_id in participants {
        let bonus = if winner == Some(user_id.as_str()) { 50 } else { 0 };

        let row: Option<(i32, String)> = sqlx::query_as(
            r#"
            UPDATE users
            SET xp = xp + 10 + $2
            WHERE id = $1
            RETURNING xp, rank
            "#,
        )
        .bind(user_id)
        .bind(bonus)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((xp, old_rank)) = row else { continue };

        let new_rank = rank_for_xp(xp);
        if new_rank != old_rank {
            sqlx::query("UPDATE users SET rank = $2 WHERE id = $1")
                .bind(user_id)
                .bind(new_rank)
                .execute(&mut *tx)
                .await?;
            rank_ups.push(RankUp {
                user_id: user_id.clone(),
                old_rank,
                new_rank: new_rank.to_string(),
            });
        }
    }

    tx.commit().await?;
    Ok(rank_ups)
}

/// Overwrite a user's country close/far histogram.
pub async fn update_country_stats(
    pool: &DbPool,
    user_id: &str,
    stats: &HashMap<String, CountryStat>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET country_stats = $2 WHERE id = $1")
        .bind(user_id)
        .bind(Json(stats))
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(ban_reason: Option<&str>, banned_until: Option<DateTime<Utc>>) -> User {
        User {
            id: "usr_test".into(),
            name: "Player".into(),
            avatar: String::new(),
            xp: 0,
            rank: "Ashborn".into(),
            role: "user".into(),
            clan_id: None,
            country_stats: Json(HashMap::new()),
            ban_reason: ban_reason.map(str::to_string),
            banned_until,
        }
    }

    #[test]
    fn test_ban_without_expiry_is_permanent() {
        let now = Utc::now();
        assert!(user(Some("toxic"), None).is_banned(now));
    }

    #[test]
    fn test_expired_ban_no_longer_applies() {
        let now = Utc::now();
        let past = now - chrono::Duration::hours(1);
        let future = now + chrono::Duration::hours(1);
        assert!(!user(Some("toxic"), Some(past)).is_banned(now));
        assert!(user(Some("toxic"), Some(future)).is_banned(now));
        assert!(!user(None, None).is_banned(now));
    }
}
