//! Events produced by the duel reducer
//!
//! The engine maps these 1:1 onto outbound socket payloads and side effects
//! (arming timers, scheduling the next round, finalizing rewards).

use std::collections::HashMap;

use super::state::Guess;

#[derive(Debug, Clone, PartialEq)]
pub enum DuelEvent {
    /// Game began; carries starting HP and the round timer to announce.
    GameStarted { hp: HashMap<String, i32>, timer: u32 },

    /// A round opened. The engine arms the round timer from this.
    RoundStarted { round: usize, lat: f64, lon: f64, url: String, timer: u32, started_at_ms: i64 },

    /// Someone guessed; opponents learn only that it happened.
    PlayerGuessed { player: String },

    /// Round expired with fewer than two guesses; penalty HP applied.
    RoundTimedOut { hp: HashMap<String, i32>, num_guesses: usize },

    /// Both duel guesses in: winner, damage dealt, updated HP, full results.
    RoundEnded {
        round: usize,
        winner: String,
        damage: i32,
        hp: HashMap<String, i32>,
        results: Vec<Guess>,
        lat: f64,
        lon: f64,
    },

    /// Clan-war round resolved; running solo score.
    WarRoundEnded { round: usize, total_score: i64 },

    /// Duel over. `winner` is None only if the HP map was empty.
    GameEnded { winner: Option<String>, total_distances: HashMap<String, f64> },

    /// Clan-war lobby finished; the engine reports the score to the war.
    WarEnded { war_id: String, player: String, total_score: i64 },

    /// A transition hit inconsistent state and was refused.
    Error { code: &'static str, message: String },
}

impl DuelEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, DuelEvent::Error { .. })
    }
}
