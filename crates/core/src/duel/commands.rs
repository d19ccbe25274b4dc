//! Commands accepted by the duel reducer

/// A state-machine command. Roster changes (join/leave/reconnect) live in the
/// engine, not here: they touch sockets and the lobby store, never HP or
/// rounds.
#[derive(Debug, Clone, PartialEq)]
pub enum DuelCommand {
    /// Begin the game. Idempotent once started.
    Start,
    /// Begin the round at `current_index`. Idempotent per round index.
    StartRound,
    /// Record a guess for the current round. A second guess from the same
    /// user in one round is silently ignored.
    SubmitGuess { user_id: String, lat: f64, lon: f64 },
    /// Resolve the round at `round`. No-op unless `round` is the current,
    /// unresolved round - stale timer firings land here harmlessly.
    EndRound { round: usize },
    /// Force the game to its end state (client-initiated or death check).
    EndGame,
}
