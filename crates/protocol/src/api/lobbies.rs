//! Lobby endpoint types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLobbyResponse {
    #[serde(rename = "InviteCode")]
    pub invite_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Single random location for solo practice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomLocationResponse {
    pub lat: f64,
    pub lon: f64,
}
