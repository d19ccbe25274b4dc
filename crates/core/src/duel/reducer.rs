//! Duel state reducer - the heart of the game logic.
//!
//! A pure function takes game state and a command and returns the new state
//! plus the events that occurred. The engine broadcasts the events in order
//! and performs their side effects (timers, persistence, rewards), so every
//! rule below is exercised without sockets, redis, or a clock.

use crate::geo::haversine_distance;
use crate::scoring::points;

use super::commands::DuelCommand;
use super::events::DuelEvent;
use super::rules::{NO_GUESS_DAMAGE, SINGLE_GUESS_DAMAGE};
use super::state::{DuelState, GameMode, Guess};

/// Result of applying a command to the game state.
#[derive(Debug)]
pub struct ReducerResult {
    /// The updated game state.
    pub state: DuelState,
    /// Events that occurred, in broadcast order.
    pub events: Vec<DuelEvent>,
    /// Whether the state actually changed.
    pub changed: bool,
}

impl ReducerResult {
    /// A command that had no effect (duplicate, stale, or out of phase).
    fn unchanged(state: DuelState) -> Self {
        Self { state, events: vec![], changed: false }
    }

    /// State changed; `events` may be empty for silent transitions.
    fn with_events(state: DuelState, events: Vec<DuelEvent>) -> Self {
        Self { state, events, changed: true }
    }

    /// A transition refused because the state is inconsistent.
    fn error(state: DuelState, code: &'static str, message: String) -> Self {
        Self { state, events: vec![DuelEvent::Error { code, message }], changed: false }
    }

    pub fn has_error(&self) -> bool {
        self.events.iter().any(DuelEvent::is_error)
    }
}

/// Apply a command to game state, returning new state + events.
///
/// Deterministic given the same `(state, command, now_ms)`; `now_ms` is
/// passed in rather than read from a clock for testability.
pub fn reduce(state: &DuelState, command: DuelCommand, now_ms: i64) -> ReducerResult {
    match command {
        DuelCommand::Start => handle_start(state.clone()),
        DuelCommand::StartRound => handle_start_round(state.clone(), now_ms),
        DuelCommand::SubmitGuess { user_id, lat, lon } => {
            handle_submit_guess(state.clone(), user_id, lat, lon)
        }
        DuelCommand::EndRound { round } => handle_end_round(state.clone(), round),
        DuelCommand::EndGame => handle_end_game(state.clone()),
    }
}

fn handle_start(mut state: DuelState) -> ReducerResult {
    if state.started {
        return ReducerResult::unchanged(state);
    }
    state.started = true;

    let event = DuelEvent::GameStarted { hp: state.hp.clone(), timer: state.timer_secs };
    ReducerResult::with_events(state, vec![event])
}

fn handle_start_round(mut state: DuelState, now_ms: i64) -> ReducerResult {
    if !state.started {
        return ReducerResult::unchanged(state);
    }

    let round = state.current_index;
    if state.round_started(round) {
        return ReducerResult::unchanged(state);
    }
    let Some(location) = state.current_location().cloned() else {
        return ReducerResult::unchanged(state);
    };

    state.started_rounds.push(round);
    state.round_start_ms = now_ms;

    let event = DuelEvent::RoundStarted {
        round,
        lat: location.lat,
        lon: location.lon,
        url: location.url,
        timer: state.timer_secs,
        started_at_ms: now_ms,
    };
    ReducerResult::with_events(state, vec![event])
}

fn handle_submit_guess(mut state: DuelState, user_id: String, lat: f64, lon: f64) -> ReducerResult {
    if !state.started {
        return ReducerResult::unchanged(state);
    }

    // Only participants guess: duelists are the HP keys, the war player is solo.
    let is_participant = match state.mode {
        GameMode::Duel => state.hp.contains_key(&user_id),
        GameMode::ClanWar => state.solo_player.as_deref() == Some(user_id.as_str()),
    };
    if !is_participant || state.has_guessed(&user_id) {
        return ReducerResult::unchanged(state);
    }

    let Some(location) = state.current_location().cloned() else {
        return ReducerResult::unchanged(state);
    };

    let distance = haversine_distance(lat, lon, location.lat, location.lon);
    let guess = Guess {
        player: user_id.clone(),
        distance,
        lat,
        lon,
        country: location.country,
        points: None,
    };

    let key = DuelState::round_key(state.current_index);
    state.guesses.entry(key).or_default().push(guess);

    let event = DuelEvent::PlayerGuessed { player: user_id };
    ReducerResult::with_events(state, vec![event])
}

fn handle_end_round(state: DuelState, round: usize) -> ReducerResult {
    // Stale timers and duplicate resolutions land here and do nothing.
    if round != state.current_index
        || state.round_ended(round)
        || !state.round_started(round)
    {
        return ReducerResult::unchanged(state);
    }

    match state.mode {
        GameMode::ClanWar => resolve_war_round(state, round),
        GameMode::Duel => resolve_duel_round(state, round),
    }
}

fn resolve_war_round(mut state: DuelState, round: usize) -> ReducerResult {
    let key = DuelState::round_key(round);
    let mut scored = false;

    if let Some(guesses) = state.guesses.get_mut(&key)
        && let Some(guess) = guesses.first_mut()
    {
        let pts = points(guess.distance);
        guess.points = Some(pts);
        state.total_score += i64::from(pts);
        scored = true;
    }

    state.ended_rounds.push(round);
    state.current_index += 1;

    if state.current_index >= state.locations.len() {
        let event = DuelEvent::WarEnded {
            war_id: state.war_id.clone().unwrap_or_default(),
            player: state.solo_player.clone().unwrap_or_default(),
            total_score: state.total_score,
        };
        return ReducerResult::with_events(state, vec![event]);
    }

    // A round nobody guessed advances silently.
    let events = if scored {
        vec![DuelEvent::WarRoundEnded { round, total_score: state.total_score }]
    } else {
        vec![]
    };
    ReducerResult::with_events(state, events)
}

fn resolve_duel_round(mut state: DuelState, round: usize) -> ReducerResult {
    let key = DuelState::round_key(round);
    let guesses: Vec<Guess> = state.guesses.get(&key).cloned().unwrap_or_default();

    if guesses.len() < 2 {
        return resolve_short_round(state, round, guesses.len());
    }

    // Both guessed: the points gap becomes damage to the loser.
    let pts: Vec<i32> = guesses.iter().map(|g| points(g.distance)).collect();
    let (winner_idx, loser_idx) = if pts[0] >= pts[1] { (0, 1) } else { (1, 0) };
    let loser_id = guesses[loser_idx].player.clone();
    let damage = pts[winner_idx] - pts[loser_idx];

    if !state.hp.contains_key(&loser_id) {
        return ReducerResult::error(
            state,
            "HP_MISSING",
            format!("no HP entry for {loser_id} at round {round}"),
        );
    }

    if let Some(stored) = state.guesses.get_mut(&key) {
        for (guess, p) in stored.iter_mut().zip(&pts) {
            guess.points = Some(*p);
        }
    }
    state.ended_rounds.push(round);

    let hp = state.hp.get_mut(&loser_id).map(|hp| {
        *hp -= damage;
        *hp
    });

    if hp.is_some_and(|hp| hp <= 0) {
        let events = vec![finish_game(&state)];
        return ReducerResult::with_events(state, events);
    }

    let location = &state.locations[round];
    let ended = DuelEvent::RoundEnded {
        round,
        winner: guesses[winner_idx].player.clone(),
        damage,
        hp: state.hp.clone(),
        results: state.guesses.get(&key).cloned().unwrap_or_default(),
        lat: location.lat,
        lon: location.lon,
    };

    state.current_index += 1;
    let mut events = vec![ended];
    if state.current_index >= state.locations.len() {
        events.push(finish_game(&state));
    }
    ReducerResult::with_events(state, events)
}

/// Zero or one guess: flat penalties instead of a points gap.
fn resolve_short_round(mut state: DuelState, round: usize, num_guesses: usize) -> ReducerResult {
    let key = DuelState::round_key(round);
    let guesser = state.guesses.get(&key).and_then(|g| g.first()).map(|g| g.player.clone());

    for (player, hp) in state.hp.iter_mut() {
        match &guesser {
            None => *hp -= NO_GUESS_DAMAGE,
            Some(who) if player != who => *hp -= SINGLE_GUESS_DAMAGE,
            Some(_) => {}
        }
    }

    state.ended_rounds.push(round);

    if state.hp.values().any(|hp| *hp <= 0) {
        let events = vec![finish_game(&state)];
        return ReducerResult::with_events(state, events);
    }

    let timed_out = DuelEvent::RoundTimedOut { hp: state.hp.clone(), num_guesses };

    state.current_index += 1;
    let mut events = vec![timed_out];
    if state.current_index >= state.locations.len() {
        events.push(finish_game(&state));
    }
    ReducerResult::with_events(state, events)
}

fn handle_end_game(state: DuelState) -> ReducerResult {
    if !state.started {
        return ReducerResult::unchanged(state);
    }

    let event = match state.mode {
        GameMode::Duel => finish_game(&state),
        GameMode::ClanWar => DuelEvent::WarEnded {
            war_id: state.war_id.clone().unwrap_or_default(),
            player: state.solo_player.clone().unwrap_or_default(),
            total_score: state.total_score,
        },
    };
    ReducerResult::with_events(state, vec![event])
}

fn finish_game(state: &DuelState) -> DuelEvent {
    DuelEvent::GameEnded { winner: state.leader(), total_distances: state.total_distances() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duel::rules::STARTING_HP;
    use crate::duel::state::RoundLocation;

    const PARIS: (f64, f64) = (48.8566, 2.3522);

    fn paris_locations(n: usize) -> Vec<RoundLocation> {
        (0..n)
            .map(|_| RoundLocation {
                lat: PARIS.0,
                lon: PARIS.1,
                region: "Europe".into(),
                country: "France".into(),
                url: "https://www.google.com/maps/@48.8566,2.3522,17z".into(),
            })
            .collect()
    }

    fn started_duel(rounds: usize) -> DuelState {
        let state = DuelState::new_duel(
            paris_locations(rounds),
            &["usr_a".to_string(), "usr_b".to_string()],
            240,
        );
        let state = reduce(&state, DuelCommand::Start, 1_000).state;
        reduce(&state, DuelCommand::StartRound, 1_000).state
    }

    fn guess(state: &DuelState, user: &str, lat: f64, lon: f64) -> DuelState {
        reduce(state, DuelCommand::SubmitGuess { user_id: user.into(), lat, lon }, 2_000).state
    }

    #[test]
    fn test_start_is_idempotent() {
        let state = DuelState::new_duel(
            paris_locations(2),
            &["usr_a".to_string(), "usr_b".to_string()],
            240,
        );
        let first = reduce(&state, DuelCommand::Start, 0);
        assert!(first.changed);
        assert!(matches!(first.events[0], DuelEvent::GameStarted { timer: 240, .. }));

        let second = reduce(&first.state, DuelCommand::Start, 0);
        assert!(!second.changed);
        assert!(second.events.is_empty());
    }

    #[test]
    fn test_round_start_records_time_and_is_idempotent() {
        let state = DuelState::new_duel(
            paris_locations(2),
            &["usr_a".to_string(), "usr_b".to_string()],
            240,
        );
        let state = reduce(&state, DuelCommand::Start, 0).state;

        let first = reduce(&state, DuelCommand::StartRound, 123_456);
        assert!(matches!(
            first.events[0],
            DuelEvent::RoundStarted { round: 0, started_at_ms: 123_456, .. }
        ));
        assert_eq!(first.state.round_start_ms, 123_456);

        let again = reduce(&first.state, DuelCommand::StartRound, 999_999);
        assert!(!again.changed);
    }

    #[test]
    fn test_perfect_round_damage() {
        // S1: A guesses the exact spot, B is ~47 km off along the parallel.
        let state = started_duel(3);
        let state = guess(&state, "usr_a", PARIS.0, PARIS.1);
        let state = guess(&state, "usr_b", PARIS.0, 3.0);
        assert!(state.round_complete());

        let result = reduce(&state, DuelCommand::EndRound { round: 0 }, 3_000);
        let DuelEvent::RoundEnded { winner, damage, hp, results, .. } = &result.events[0] else {
            panic!("expected RoundEnded, got {:?}", result.events);
        };

        assert_eq!(winner, "usr_a");
        let points_b = results.iter().find(|g| g.player == "usr_b").unwrap().points.unwrap();
        assert!((4500..4600).contains(&points_b), "points_b = {points_b}");
        assert_eq!(*damage, 5000 - points_b);
        assert_eq!(hp["usr_a"], STARTING_HP);
        assert_eq!(hp["usr_b"], STARTING_HP - damage);
        assert_eq!(result.state.current_index, 1);
    }

    #[test]
    fn test_second_guess_from_same_user_is_silently_dropped() {
        let state = started_duel(2);
        let state = guess(&state, "usr_a", PARIS.0, PARIS.1);
        let result = reduce(
            &state,
            DuelCommand::SubmitGuess { user_id: "usr_a".into(), lat: 0.0, lon: 0.0 },
            2_500,
        );
        assert!(!result.changed);
        assert_eq!(result.state.current_guesses().len(), 1);
    }

    #[test]
    fn test_non_participant_guess_is_dropped() {
        let state = started_duel(2);
        let result = reduce(
            &state,
            DuelCommand::SubmitGuess { user_id: "usr_intruder".into(), lat: 0.0, lon: 0.0 },
            2_500,
        );
        assert!(!result.changed);
    }

    #[test]
    fn test_timeout_with_no_guesses() {
        // S2: both lose 500 HP.
        let state = started_duel(3);
        let result = reduce(&state, DuelCommand::EndRound { round: 0 }, 5_000);

        let DuelEvent::RoundTimedOut { hp, num_guesses } = &result.events[0] else {
            panic!("expected RoundTimedOut");
        };
        assert_eq!(*num_guesses, 0);
        assert_eq!(hp["usr_a"], 5500);
        assert_eq!(hp["usr_b"], 5500);
        assert_eq!(result.state.current_index, 1);
    }

    #[test]
    fn test_timeout_with_one_guess_penalizes_the_absent_player() {
        // S3: A guessed, B did not.
        let state = started_duel(3);
        let state = guess(&state, "usr_a", PARIS.0, PARIS.1);
        let result = reduce(&state, DuelCommand::EndRound { round: 0 }, 5_000);

        let DuelEvent::RoundTimedOut { hp, num_guesses } = &result.events[0] else {
            panic!("expected RoundTimedOut");
        };
        assert_eq!(*num_guesses, 1);
        assert_eq!(hp["usr_a"], 6000);
        assert_eq!(hp["usr_b"], 5000);
    }

    #[test]
    fn test_round_end_is_idempotent_and_ignores_stale_indices() {
        let state = started_duel(3);
        let resolved = reduce(&state, DuelCommand::EndRound { round: 0 }, 5_000);
        assert!(resolved.changed);

        // A late timer for round 0 fires after the index advanced.
        let stale = reduce(&resolved.state, DuelCommand::EndRound { round: 0 }, 6_000);
        assert!(!stale.changed);
        assert!(stale.events.is_empty());

        // Round 1 has not started yet, so its end is also a no-op.
        let unstarted = reduce(&resolved.state, DuelCommand::EndRound { round: 1 }, 6_000);
        assert!(!unstarted.changed);
    }

    #[test]
    fn test_death_ends_the_game_without_a_round_ended_event() {
        // S4: keep losing perfect-vs-miss rounds until B drops to zero.
        let mut state = started_duel(20);
        let mut rounds = 0;
        loop {
            state = guess(&state, "usr_a", PARIS.0, PARIS.1);
            state = guess(&state, "usr_b", PARIS.0, 10.0);
            let result = reduce(&state, DuelCommand::EndRound { round: state.current_index }, 0);
            state = result.state;
            rounds += 1;
            assert!(rounds < 20, "duel never resolved");

            match result.events.last() {
                Some(DuelEvent::GameEnded { winner, .. }) => {
                    assert_eq!(winner.as_deref(), Some("usr_a"));
                    // The killing round reports no round_ended.
                    assert_eq!(result.events.len(), 1);
                    assert!(state.hp["usr_b"] <= 0);
                    break;
                }
                Some(DuelEvent::RoundEnded { .. }) => {
                    state = reduce(&state, DuelCommand::StartRound, 0).state;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn test_hp_is_monotonically_non_increasing() {
        let mut state = started_duel(6);
        let mut last_hp = state.hp.clone();

        for _ in 0..4 {
            state = guess(&state, "usr_a", PARIS.0, PARIS.1);
            state = guess(&state, "usr_b", PARIS.0, 4.0);
            let result = reduce(&state, DuelCommand::EndRound { round: state.current_index }, 0);
            state = result.state;

            for (player, hp) in &state.hp {
                assert!(hp <= &last_hp[player], "HP increased for {player}");
            }
            last_hp = state.hp.clone();

            if result.events.iter().any(|e| matches!(e, DuelEvent::GameEnded { .. })) {
                break;
            }
            state = reduce(&state, DuelCommand::StartRound, 0).state;
        }
    }

    #[test]
    fn test_exhausted_location_list_ends_the_game() {
        let state = started_duel(1);
        let state = guess(&state, "usr_a", PARIS.0, PARIS.1);
        let state = guess(&state, "usr_b", PARIS.0, 3.0);
        let result = reduce(&state, DuelCommand::EndRound { round: 0 }, 0);

        assert!(matches!(result.events[0], DuelEvent::RoundEnded { .. }));
        assert!(matches!(result.events[1], DuelEvent::GameEnded { .. }));
    }

    #[test]
    fn test_total_distances_accumulate_per_player() {
        let state = started_duel(2);
        let state = guess(&state, "usr_a", PARIS.0, PARIS.1);
        let state = guess(&state, "usr_b", PARIS.0, 3.0);
        let state = reduce(&state, DuelCommand::EndRound { round: 0 }, 0).state;
        let state = reduce(&state, DuelCommand::StartRound, 0).state;
        let state = guess(&state, "usr_b", PARIS.0, 3.0);

        let totals = state.total_distances();
        assert!(totals["usr_a"] < 1.0);
        let single = haversine_distance(PARIS.0, 3.0, PARIS.0, PARIS.1);
        assert!((totals["usr_b"] - 2.0 * single).abs() < 1.0);
    }

    #[test]
    fn test_missing_hp_entry_is_a_hard_error() {
        let state = started_duel(2);
        let state = guess(&state, "usr_a", PARIS.0, PARIS.1);
        let mut state = guess(&state, "usr_b", PARIS.0, 3.0);
        state.hp.remove("usr_b");

        let result = reduce(&state, DuelCommand::EndRound { round: 0 }, 0);
        assert!(result.has_error());
        assert!(!result.changed);
        assert!(!result.state.round_ended(0));
    }

    #[test]
    fn test_clan_war_accumulates_solo_score() {
        let state = DuelState::new_clan_war(
            paris_locations(2),
            "usr_solo".into(),
            "war_123".into(),
            120,
        );
        let state = reduce(&state, DuelCommand::Start, 0).state;
        let state = reduce(&state, DuelCommand::StartRound, 0).state;
        let state = guess(&state, "usr_solo", PARIS.0, PARIS.1);
        assert!(state.round_complete());

        let result = reduce(&state, DuelCommand::EndRound { round: 0 }, 0);
        let DuelEvent::WarRoundEnded { round: 0, total_score } = result.events[0] else {
            panic!("expected WarRoundEnded");
        };
        assert_eq!(total_score, 5000);

        // Final round: no guess, list exhausted -> war ends with the score.
        let state = reduce(&result.state, DuelCommand::StartRound, 0).state;
        let result = reduce(&state, DuelCommand::EndRound { round: 1 }, 0);
        let DuelEvent::WarEnded { ref war_id, ref player, total_score } = result.events[0] else {
            panic!("expected WarEnded");
        };
        assert_eq!(war_id, "war_123");
        assert_eq!(player, "usr_solo");
        assert_eq!(total_score, 5000);
    }

    #[test]
    fn test_clan_war_unguessed_round_advances_silently() {
        let state = DuelState::new_clan_war(
            paris_locations(3),
            "usr_solo".into(),
            "war_123".into(),
            120,
        );
        let state = reduce(&state, DuelCommand::Start, 0).state;
        let state = reduce(&state, DuelCommand::StartRound, 0).state;

        let result = reduce(&state, DuelCommand::EndRound { round: 0 }, 0);
        assert!(result.changed);
        assert!(result.events.is_empty());
        assert_eq!(result.state.current_index, 1);
        assert_eq!(result.state.total_score, 0);
    }

    #[test]
    fn test_end_game_command_reports_current_leader() {
        let state = started_duel(3);
        let state = guess(&state, "usr_a", PARIS.0, PARIS.1);
        let state = reduce(&state, DuelCommand::EndRound { round: 0 }, 0).state;

        let result = reduce(&state, DuelCommand::EndGame, 0);
        let DuelEvent::GameEnded { ref winner, .. } = result.events[0] else {
            panic!("expected GameEnded");
        };
        assert_eq!(winner.as_deref(), Some("usr_a"));
    }
}
