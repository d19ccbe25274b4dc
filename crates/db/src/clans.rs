//! Clan and clan war queries
//!
//! War participants (rosters and the pair bracket) live in one JSON column,
//! mirroring how wars are read: always as a whole. Serializing writers is the
//! engine's job (`mistduel-engine::war`); this module is plain reads/writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use mistduel_core::generate_war_id;

use crate::DbPool;

/// War and pair lifecycle states.
pub mod status {
    pub const PENDING: &str = "pending";
    pub const ONGOING: &str = "ongoing";
    pub const COMPLETED: &str = "completed";
    pub const DECLAIMED: &str = "declaimed";
}

#[derive(Debug, Clone, FromRow)]
pub struct Clan {
    pub id: String, // cln_XXXXXXXXXXXX
    pub name: String,
    pub tag: String,
    pub owner_id: String,
    pub members: Vec<String>,
    pub xp: i32,
    pub reputation: i32,
    pub wars_won: i32,
    pub wars_lost: i32,
    pub wars_total: i32,
}

/// One duel slot in a war bracket: a member from each side, their scores,
/// and the lobby once someone starts playing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarPair {
    pub clan_1: String,
    pub clan_2: String,
    pub status: String,
    pub clan_1_score: Option<i64>,
    pub clan_2_score: Option<i64>,
    pub lobby_code: Option<String>,
    pub winner: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarParticipants {
    pub clan_1: Vec<String>,
    pub clan_2: Vec<String>,
    pub pairs: Vec<WarPair>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ClanWar {
    pub id: String, // war_XXXXXXXXXXXX
    pub clan_1_id: String,
    pub clan_2_id: String,
    pub status: String,
    pub participants: Json<WarParticipants>,
    pub clan_1_score: i32,
    pub clan_2_score: i32,
    pub winner_clan_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

const WAR_COLUMNS: &str = "id, clan_1_id, clan_2_id, status, participants, \
     clan_1_score, clan_2_score, winner_clan_id, created_at, started_at, completed_at";

pub async fn get_clan(pool: &DbPool, clan_id: &str) -> Result<Option<Clan>, sqlx::Error> {
    sqlx::query_as::<_, Clan>(
        r#"
        SELECT id, name, tag, owner_id, members, xp, reputation,
               wars_won, wars_lost, wars_total
        FROM clans
        WHERE id = $1
        "#,
    )
    .bind(clan_id)
    .fetch_optional(pool)
    .await
}

pub async fn create_war(
    pool: &DbPool,
    attacker_clan_id: &str,
    defender_clan_id: &str,
) -> Result<ClanWar, sqlx::Error> {
    let id = generate_war_id();

    sqlx::query_as::<_, ClanWar>(&format!(
        r#"
        INSERT INTO clan_wars
            (id, clan_1_id, clan_2_id, status, participants,
             clan_1_score, clan_2_score, created_at)
        VALUES ($1, $2, $3, '{}', $4, 0, 0, NOW())
        RETURNING {WAR_COLUMNS}
        "#,
        status::PENDING
    ))
    .bind(&id)
    .bind(attacker_clan_id)
    .bind(defender_clan_id)
    .bind(Json(WarParticipants::default()))
    .fetch_one(pool)
    .await
}

pub async fn get_war(pool: &DbPool, war_id: &str) -> Result<Option<ClanWar>, sqlx::Error> {
    sqlx::query_as::<_, ClanWar>(&format!(
        "SELECT {WAR_COLUMNS} FROM clan_wars WHERE id = $1"
    ))
    .bind(war_id)
    .fetch_optional(pool)
    .await
}

pub async fn update_participants(
    pool: &DbPool,
    war_id: &str,
    participants: &WarParticipants,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE clan_wars SET participants = $2 WHERE id = $1")
        .bind(war_id)
        .bind(Json(participants))
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark the war ongoing once its bracket exists.
pub async fn mark_started(pool: &DbPool, war_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE clan_wars SET status = $2, started_at = NOW() WHERE id = $1")
        .bind(war_id)
        .bind(status::ONGOING)
        .execute(pool)
        .await?;
    Ok(())
}

/// Bump a clan's aggregate war score by one pair win.
pub async fn increment_war_score(
    pool: &DbPool,
    war_id: &str,
    first_clan_won: bool,
) -> Result<(), sqlx::Error> {
    let column = if first_clan_won { "clan_1_score" } else { "clan_2_score" };
    sqlx::query(&format!("UPDATE clan_wars SET {column} = {column} + 1 WHERE id = $1"))
        .bind(war_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Close a war with a winner and terminal status.
pub async fn finalize_war(
    pool: &DbPool,
    war_id: &str,
    winner_clan_id: &str,
    final_status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE clan_wars
        SET status = $2, winner_clan_id = $3, completed_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(war_id)
    .bind(final_status)
    .bind(winner_clan_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Apply one clan's share of the war reward table.
pub async fn apply_war_reward(
    pool: &DbPool,
    clan_id: &str,
    reputation_delta: i32,
    xp_delta: i32,
    won: bool,
) -> Result<(), sqlx::Error> {
    let outcome_column = if won { "wars_won" } else { "wars_lost" };
    sqlx::query(&format!(
        r#"
        UPDATE clans
        SET reputation = reputation + $2,
            xp = xp + $3,
            wars_total = wars_total + 1,
            {outcome_column} = {outcome_column} + 1
        WHERE id = $1
        "#,
    ))
    .bind(clan_id)
    .bind(reputation_delta)
    .bind(xp_delta)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participants_json_shape() {
        let participants = WarParticipants {
            clan_1: vec!["usr_a".into()],
            clan_2: vec!["usr_b".into()],
            pairs: vec![WarPair {
                clan_1: "usr_a".into(),
                clan_2: "usr_b".into(),
                status: status::PENDING.into(),
                clan_1_score: None,
                clan_2_score: Some(4200),
                lobby_code: None,
                winner: None,
            }],
        };

        let json = serde_json::to_value(&participants).unwrap();
        assert_eq!(json["pairs"][0]["status"], "pending");
        assert_eq!(json["pairs"][0]["clan_2_score"], 4200);

        let back: WarParticipants = serde_json::from_value(json).unwrap();
        assert_eq!(back, participants);
    }
}
