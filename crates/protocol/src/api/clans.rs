//! Clan war endpoint types

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWarRequest {
    #[validate(length(min = 1))]
    pub defender_clan_id: String,
}

/// Five members fielded by one side of a war.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RosterRequest {
    #[validate(length(min = 5, max = 5))]
    pub players: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarResponse {
    pub id: String,
    pub clan_1_id: String,
    pub clan_2_id: String,
    pub status: String,
    pub participants: serde_json::Value,
    pub clan_1_score: i32,
    pub clan_2_score: i32,
    pub winner_clan_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClanResponse {
    pub id: String,
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
