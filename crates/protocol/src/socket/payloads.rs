//! Socket event payload fragments

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Public profile attached to roster and matchmaking events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub user_id: String,
    pub name: String,
    pub avatar: String,
    pub xp: i32,
    pub rank: String,
}

/// One promotion reported by `rank_up`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankUpInfo {
    pub user_id: String,
    pub old_rank: String,
    pub new_rank: String,
}

/// The current round's location as replayed to a reconnecting player.
#[derive(Debug, Clone, Serialize)]
pub struct ReconnectLocation {
    pub lat: f64,
    pub lon: f64,
    pub url: String,
}

/// Game snapshot carried by `reconnect_success`.
#[derive(Debug, Clone, Serialize)]
pub struct ReconnectGameState {
    pub current_location_index: usize,
    pub locations: ReconnectLocation,
    pub roundstart_time: i64,
    /// Seconds left on the current round, clamped at zero.
    pub timer: u32,
    pub hp: HashMap<String, i32>,
    #[serde(rename = "PlayerHasGuessed")]
    pub player_has_guessed: bool,
    /// Users who have already guessed this round.
    pub player_guess: Vec<String>,
}
