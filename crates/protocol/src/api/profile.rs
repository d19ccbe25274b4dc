//! Profile endpoint types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub name: String,
    pub avatar: String,
    pub xp: i32,
    pub rank: String,
    pub role: String,
    pub country_stats: serde_json::Value,
    pub lobbies: Vec<ActiveLobby>,
}

/// A lobby the user currently belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveLobby {
    pub code: String,
    pub host_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    pub avatar: String,
    pub xp: i32,
    pub rank: String,
}
