//! Lobby database queries
//!
//! A lobby row is the durable half of a duel: invite code, roster, timer, and
//! the location sequence fixed at creation. The realtime engine owns the rest.

use sqlx::FromRow;
use sqlx::types::Json;

use mistduel_core::duel::{GameMode, RoundLocation};
use mistduel_core::generate_invite_code;

use crate::DbPool;

#[derive(Debug, Clone, FromRow)]
pub struct Lobby {
    pub invite_code: String,
    pub host_id: String, // usr_XXXXXXXXXXXX
    pub users: Vec<String>,
    pub timer: i32,
    pub locations: Json<Vec<RoundLocation>>,
    pub mode: Option<String>,
    pub war_id: Option<String>,
}

impl Lobby {
    pub fn game_mode(&self) -> GameMode {
        match self.mode.as_deref() {
            Some("clan_war") => GameMode::ClanWar,
            _ => GameMode::Duel,
        }
    }
}

/// Outcome of a join attempt.
#[derive(Debug)]
pub enum JoinOutcome {
    Joined(Lobby),
    AlreadyIn(Lobby),
    Full,
    NotFound,
}

/// Create a lobby hosted by `host_id` with a fixed location sequence.
pub async fn create(
    pool: &DbPool,
    host_id: &str,
    locations: Vec<RoundLocation>,
    timer: i32,
    mode: Option<&str>,
    war_id: Option<&str>,
) -> Result<Lobby, sqlx::Error> {
    let invite_code = generate_invite_code();

    sqlx::query_as::<_, Lobby>(
        r#"
        INSERT INTO lobbies (invite_code, host_id, users, timer, locations, mode, war_id)
        VALUES ($1, $2, ARRAY[$2], $3, $4, $5, $6)
        RETURNING invite_code, host_id, users, timer, locations, mode, war_id
        "#,
    )
    .bind(&invite_code)
    .bind(host_id)
    .bind(timer)
    .bind(Json(locations))
    .bind(mode)
    .bind(war_id)
    .fetch_one(pool)
    .await
}

pub async fn get_by_code(pool: &DbPool, invite_code: &str) -> Result<Option<Lobby>, sqlx::Error> {
    sqlx::query_as::<_, Lobby>(
        r#"
        SELECT invite_code, host_id, users, timer, locations, mode, war_id
        FROM lobbies
        WHERE invite_code = $1
        "#,
    )
    .bind(invite_code)
    .fetch_optional(pool)
    .await
}

/// Add a user to a lobby roster. Duel rosters cap at two.
pub async fn add_user(
    pool: &DbPool,
    invite_code: &str,
    user_id: &str,
) -> Result<JoinOutcome, sqlx::Error> {
    let Some(lobby) = get_by_code(pool, invite_code).await? else {
        return Ok(JoinOutcome::NotFound);
    };

    if lobby.users.iter().any(|id| id == user_id) {
        return Ok(JoinOutcome::AlreadyIn(lobby));
    }
    if lobby.users.len() >= 2 {
        return Ok(JoinOutcome::Full);
    }

    let updated = sqlx::query_as::<_, Lobby>(
        r#"
        UPDATE lobbies
        SET users = array_append(users, $2)
        WHERE invite_code = $1
        RETURNING invite_code, host_id, users, timer, locations, mode, war_id
        "#,
    )
    .bind(invite_code)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(JoinOutcome::Joined(updated))
}

pub async fn remove_user(
    pool: &DbPool,
    invite_code: &str,
    user_id: &str,
) -> Result<Option<Lobby>, sqlx::Error> {
    sqlx::query_as::<_, Lobby>(
        r#"
        UPDATE lobbies
        SET users = array_remove(users, $2)
        WHERE invite_code = $1
        RETURNING invite_code, host_id, users, timer, locations, mode, war_id
        "#,
    )
    .bind(invite_code)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &DbPool, invite_code: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM lobbies WHERE invite_code = $1")
        .bind(invite_code)
        .execute(pool)
        .await?;
    Ok(())
}

/// Lobbies whose roster contains `user_id` (profile's active-lobby list).
pub async fn get_by_user(pool: &DbPool, user_id: &str) -> Result<Vec<Lobby>, sqlx::Error> {
    sqlx::query_as::<_, Lobby>(
        r#"
        SELECT invite_code, host_id, users, timer, locations, mode, war_id
        FROM lobbies
        WHERE $1 = ANY(users)
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
