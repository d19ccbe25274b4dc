//! Per-lobby game state
//!
//! The same struct is held in the lobby actor's memory and serialized
//! verbatim into the `game:{code}` snapshot, so a process restart (or a
//! reconnect after all sockets dropped) resumes from exactly what was last
//! persisted. Guess lists are keyed by stringified round index: the snapshot
//! is JSON and object keys are strings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::rules::STARTING_HP;

/// Game mode for a lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Duel,
    ClanWar,
}

/// One location in a lobby's fixed sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundLocation {
    pub lat: f64,
    pub lon: f64,
    pub region: String,
    pub country: String,
    pub url: String,
}

/// A submitted guess. `country` is copied from the round's target location
/// (not derived from the guess) - it feeds the close/far country histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guess {
    pub player: String,
    pub distance: f64,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    /// Assigned at round end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i32>,
}

/// In-memory game state for one lobby.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelState {
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub war_id: Option<String>,
    /// The lone participant of a clan-war lobby.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solo_player: Option<String>,
    /// Fixed location sequence chosen at lobby creation.
    pub locations: Vec<RoundLocation>,
    /// 0-based index of the round currently in play.
    pub current_index: usize,
    /// Guesses keyed by stringified round index.
    pub guesses: HashMap<String, Vec<Guess>>,
    #[serde(default)]
    pub hp: HashMap<String, i32>,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub started_rounds: Vec<usize>,
    #[serde(default)]
    pub ended_rounds: Vec<usize>,
    /// Wall-clock ms at which the current round started.
    #[serde(default)]
    pub round_start_ms: i64,
    /// Accumulated solo score (clan-war mode only).
    #[serde(default)]
    pub total_score: i64,
    /// Round timer, seconds.
    pub timer_secs: u32,
}

impl DuelState {
    /// State for a fresh duel between `participants`.
    pub fn new_duel(
        locations: Vec<RoundLocation>,
        participants: &[String],
        timer_secs: u32,
    ) -> Self {
        let hp = participants.iter().map(|id| (id.clone(), STARTING_HP)).collect();
        Self {
            mode: GameMode::Duel,
            war_id: None,
            solo_player: None,
            locations,
            current_index: 0,
            guesses: HashMap::new(),
            hp,
            started: false,
            started_rounds: Vec::new(),
            ended_rounds: Vec::new(),
            round_start_ms: 0,
            total_score: 0,
            timer_secs,
        }
    }

    /// State for a clan-war lobby: one player, no HP, a running score.
    pub fn new_clan_war(
        locations: Vec<RoundLocation>,
        player: String,
        war_id: String,
        timer_secs: u32,
    ) -> Self {
        Self {
            mode: GameMode::ClanWar,
            war_id: Some(war_id),
            solo_player: Some(player),
            locations,
            current_index: 0,
            guesses: HashMap::new(),
            hp: HashMap::new(),
            started: false,
            started_rounds: Vec::new(),
            ended_rounds: Vec::new(),
            round_start_ms: 0,
            total_score: 0,
            timer_secs,
        }
    }

    /// Snapshot key for a round index.
    pub fn round_key(round: usize) -> String {
        round.to_string()
    }

    /// The location for the round currently in play, if any remain.
    pub fn current_location(&self) -> Option<&RoundLocation> {
        self.locations.get(self.current_index)
    }

    /// Guesses recorded for the current round.
    pub fn current_guesses(&self) -> &[Guess] {
        self.guesses.get(&Self::round_key(self.current_index)).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `user_id` already guessed in the current round.
    pub fn has_guessed(&self, user_id: &str) -> bool {
        self.current_guesses().iter().any(|g| g.player == user_id)
    }

    /// Guesses that complete a round: both players in a duel, one in clan war.
    pub fn guess_threshold(&self) -> usize {
        match self.mode {
            GameMode::Duel => 2,
            GameMode::ClanWar => 1,
        }
    }

    /// Whether the current round has collected enough guesses to resolve.
    pub fn round_complete(&self) -> bool {
        self.current_guesses().len() >= self.guess_threshold()
    }

    pub fn round_started(&self, round: usize) -> bool {
        self.started_rounds.contains(&round)
    }

    pub fn round_ended(&self, round: usize) -> bool {
        self.ended_rounds.contains(&round)
    }

    /// Total guessed distance per player across all rounds.
    pub fn total_distances(&self) -> HashMap<String, f64> {
        let mut totals: HashMap<String, f64> = HashMap::new();
        for guesses in self.guesses.values() {
            for guess in guesses {
                *totals.entry(guess.player.clone()).or_default() += guess.distance;
            }
        }
        totals
    }

    /// Participant with the most HP left; ties break to the lowest user id.
    pub fn leader(&self) -> Option<String> {
        self.hp
            .iter()
            .max_by(|(id_a, hp_a), (id_b, hp_b)| hp_a.cmp(hp_b).then(id_b.cmp(id_a)))
            .map(|(id, _)| id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations(n: usize) -> Vec<RoundLocation> {
        (0..n)
            .map(|i| RoundLocation {
                lat: i as f64,
                lon: i as f64,
                region: "Europe".into(),
                country: "France".into(),
                url: format!("https://www.google.com/maps/@{i},{i},17z"),
            })
            .collect()
    }

    #[test]
    fn test_new_duel_initializes_hp() {
        let state =
            DuelState::new_duel(locations(3), &["usr_a".to_string(), "usr_b".to_string()], 240);
        assert_eq!(state.hp.get("usr_a"), Some(&6000));
        assert_eq!(state.hp.get("usr_b"), Some(&6000));
        assert_eq!(state.guess_threshold(), 2);
    }

    #[test]
    fn test_clan_war_has_no_hp() {
        let state =
            DuelState::new_clan_war(locations(3), "usr_a".into(), "war_1".into(), 120);
        assert!(state.hp.is_empty());
        assert_eq!(state.guess_threshold(), 1);
    }

    #[test]
    fn test_leader_tie_breaks_to_lowest_id() {
        let mut state =
            DuelState::new_duel(locations(1), &["usr_b".to_string(), "usr_a".to_string()], 240);
        assert_eq!(state.leader().as_deref(), Some("usr_a"));

        state.hp.insert("usr_b".into(), 5500);
        assert_eq!(state.leader().as_deref(), Some("usr_a"));
    }

    #[test]
    fn test_snapshot_round_trips_with_string_round_keys() {
        let mut state =
            DuelState::new_duel(locations(2), &["usr_a".to_string(), "usr_b".to_string()], 240);
        state.guesses.insert(
            DuelState::round_key(0),
            vec![Guess {
                player: "usr_a".into(),
                distance: 12.5,
                lat: 1.0,
                lon: 2.0,
                country: "France".into(),
                points: None,
            }],
        );

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"guesses\":{\"0\":"));

        let back: DuelState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.guesses["0"], state.guesses["0"]);
        assert_eq!(back.hp, state.hp);
    }
}
