//! Socket event enums
//!
//! Inbound and outbound messages dispatch on a `type` tag. Unknown or
//! malformed inbound messages fail deserialization; the socket handler logs
//! and drops them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use mistduel_core::duel::Guess;

use super::payloads::{PlayerInfo, RankUpInfo, ReconnectGameState};

/// Client-to-server messages on the lobby and matchmaking sockets.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    GameStart,
    GameEnd,
    SubmitGuess {
        lat: f64,
        lon: f64,
    },
    /// Re-announce this connection to the lobby.
    PlayerJoined,
    PlayerLeft,
    PlayerReconnect,
    Broadcast {
        message: serde_json::Value,
    },
    RoundStart,
    RoundEnd,
    /// Camera/viewport relay for the spectator overlay.
    Spectate {
        num_player: u32,
        #[serde(flatten)]
        data: serde_json::Map<String, serde_json::Value>,
    },
    /// Matchmaking channel only.
    StopMatchmaking,
}

/// Server-to-client messages. Serialize-only: the server never parses these.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    PlayerJoined {
        player: String,
        host: String,
        players: Vec<PlayerInfo>,
    },
    PlayerLeft {
        player: String,
        players: Vec<PlayerInfo>,
    },
    PlayerDisconnected {
        player: String,
    },
    PlayerReconnected {
        player: String,
    },
    ReconnectSuccess {
        host: String,
        players: Vec<PlayerInfo>,
        #[serde(skip_serializing_if = "Option::is_none")]
        game_state: Option<ReconnectGameState>,
    },
    GameStarted {
        hp: HashMap<String, i32>,
        timer: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
    },
    RoundStarted {
        lat: f64,
        lon: f64,
        url: String,
        timer: u32,
        #[serde(rename = "RoundStartTime")]
        round_start_time: i64,
    },
    RoundTimedout {
        hp: HashMap<String, i32>,
        num_guesses: usize,
    },
    RoundEnded {
        winner: String,
        damage: i32,
        hp: HashMap<String, i32>,
        results: Vec<Guess>,
        lat: f64,
        lon: f64,
    },
    #[serde(rename = "round_ended")]
    WarRoundEnded {
        total_score: i64,
        round: usize,
    },
    PlayerGuessed {
        player: String,
    },
    GameEnded {
        winner: Option<String>,
        total_distances: HashMap<String, f64>,
        players: Vec<PlayerInfo>,
    },
    RankUp {
        rank_ups: Vec<RankUpInfo>,
    },
    Broadcast {
        player: String,
        message: serde_json::Value,
    },
    /// Spectator relay mirror of a participant's `spectate` message.
    Spectate {
        num_player: u32,
        #[serde(flatten)]
        data: serde_json::Map<String, serde_json::Value>,
    },
    QueueJoined {
        position: usize,
    },
    MatchFound {
        #[serde(rename = "LobbyCode")]
        lobby_code: String,
        opponent: PlayerInfo,
    },
    Redirect {
        #[serde(rename = "LobbyCode")]
        lobby_code: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_dispatches_on_type_tag() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type": "submit_guess", "lat": 48.85, "lon": 2.35}"#)
                .unwrap();
        assert!(matches!(event, ClientEvent::SubmitGuess { .. }));

        let event: ClientEvent = serde_json::from_str(r#"{"type": "game_start"}"#).unwrap();
        assert!(matches!(event, ClientEvent::GameStart));
    }

    #[test]
    fn test_unknown_type_fails_deserialization() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type": "warp_drive"}"#).is_err());
    }

    #[test]
    fn test_server_event_wire_spelling() {
        let event = ServerEvent::Redirect { lobby_code: "a1b2c3d4".into() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "redirect");
        assert_eq!(json["LobbyCode"], "a1b2c3d4");

        let event = ServerEvent::RoundStarted {
            lat: 1.0,
            lon: 2.0,
            url: "u".into(),
            timer: 240,
            round_start_time: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "round_started");
        assert_eq!(json["RoundStartTime"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_war_round_ended_shares_the_round_ended_tag() {
        let event = ServerEvent::WarRoundEnded { total_score: 4321, round: 2 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "round_ended");
        assert_eq!(json["total_score"], 4321);
    }
}
