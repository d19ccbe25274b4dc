//! Lobby actor
//!
//! One actor per live lobby. All per-lobby state - the connection roster,
//! the game state machine, timers, kick tasks - is owned by the actor and
//! mutated only from its mailbox loop, which is what guarantees per-lobby
//! event ordering. The pure reducer in `mistduel-core` makes every game
//! decision; this file does the IO around it: broadcasting events, arming
//! and cancelling timers, persisting snapshots, and settling rewards.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Duration;

use mistduel_core::duel::rules::INTER_ROUND_DELAY_SECS;
use mistduel_core::duel::{DuelCommand, DuelEvent, DuelState, GameMode, reduce};
use mistduel_db::{DbPool, lobbies, users};
use mistduel_protocol::socket::ServerEvent;
use mistduel_protocol::socket::payloads::{
    PlayerInfo, RankUpInfo, ReconnectGameState, ReconnectLocation,
};

use crate::manager::LobbyMap;
use crate::registry::{ConnHandle, Roster};
use crate::snapshot::{SnapshotError, SnapshotStore};
use crate::supervisor::{KickTasks, spawn_kick};
use crate::war::{self, WarRegistry};

/// Mailbox depth per lobby.
pub(crate) const LOBBY_MAILBOX: usize = 64;

/// Why a join was refused; maps onto the 1008 close reason.
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("Lobby not found")]
    LobbyNotFound,

    #[error("Lobby is full")]
    LobbyFull,

    #[error("Storage error")]
    Storage,
}

impl JoinError {
    pub fn close_reason(&self) -> &'static str {
        match self {
            JoinError::LobbyNotFound | JoinError::Storage => "Lobby not found",
            JoinError::LobbyFull => "Lobby is full",
        }
    }
}

/// Commands delivered to a lobby actor.
#[derive(Debug)]
pub enum LobbyCommand {
    Join {
        user_id: String,
        conn: ConnHandle,
        respond: oneshot::Sender<Result<(), JoinError>>,
    },
    /// Voluntary leave of one connection; `conn_id: None` removes every
    /// connection of the user (the kick path).
    Leave {
        user_id: String,
        conn_id: Option<u64>,
    },
    /// Unexpected socket drop; starts the grace window.
    Disconnected {
        user_id: String,
        conn_id: u64,
    },
    Reconnect {
        user_id: String,
        conn: ConnHandle,
    },
    SpectatorJoin {
        conn: ConnHandle,
    },
    SpectatorLeave {
        conn_id: u64,
    },
    GameStart,
    GameEnd,
    RoundStart,
    /// `round: None` means "the current round" (client-initiated).
    RoundEnd {
        round: Option<usize>,
    },
    SubmitGuess {
        user_id: String,
        lat: f64,
        lon: f64,
    },
    Chat {
        user_id: String,
        message: serde_json::Value,
    },
    /// Camera relay from a participant to the spectator pool.
    SpectateRelay {
        num_player: u32,
        data: serde_json::Map<String, serde_json::Value>,
    },
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct LobbyActor {
    code: String,
    pool: DbPool,
    snapshots: Option<SnapshotStore>,
    wars: WarRegistry,
    rx: mpsc::Receiver<LobbyCommand>,
    /// Own sender, cloned into timer tasks.
    tx: mpsc::Sender<LobbyCommand>,
    /// Manager map, for self-removal on shutdown.
    lobbies_map: LobbyMap,
    roster: Roster,
    game: Option<DuelState>,
    round_timer: Option<JoinHandle<()>>,
    next_round_task: Option<JoinHandle<()>>,
    kick_tasks: KickTasks,
    /// Set once a player attached; empty-roster shutdown only applies after.
    had_players: bool,
    closing: bool,
}

impl LobbyActor {
    pub fn new(
        code: &str,
        pool: DbPool,
        snapshots: Option<SnapshotStore>,
        wars: WarRegistry,
        rx: mpsc::Receiver<LobbyCommand>,
        tx: mpsc::Sender<LobbyCommand>,
        lobbies_map: LobbyMap,
    ) -> Self {
        Self {
            code: code.to_string(),
            pool,
            snapshots,
            wars,
            rx,
            tx,
            lobbies_map,
            roster: Roster::new(),
            game: None,
            round_timer: None,
            next_round_task: None,
            kick_tasks: KickTasks::new(),
            had_players: false,
            closing: false,
        }
    }

    /// Main run loop - processes commands from the mailbox.
    pub async fn run(mut self) {
        self.restore_snapshot().await;
        tracing::info!(code = %self.code, "Lobby actor started");

        while let Some(cmd) = self.rx.recv().await {
            self.handle(cmd).await;

            if self.closing || (self.had_players && self.roster.players_empty()) {
                break;
            }
        }

        self.cancel_round_timer();
        self.cancel_next_round();
        self.kick_tasks.cancel_all();
        self.lobbies_map.write().await.remove(&self.code);
        tracing::info!(code = %self.code, "Lobby actor shut down");
    }

    /// Resume a game left behind by a restart or an all-disconnected window.
    async fn restore_snapshot(&mut self) {
        let Some(store) = &self.snapshots else { return };
        match store.load_game(&self.code).await {
            Ok(Some(state)) => {
                tracing::info!(code = %self.code, round = state.current_index, "Restored game snapshot");
                self.game = Some(state);
            }
            Ok(None) => {}
            Err(SnapshotError::Corrupt { .. }) => {
                tracing::warn!(code = %self.code, "Corrupt game snapshot, discarding");
                if let Err(e) = store.delete_game(&self.code).await {
                    tracing::warn!(code = %self.code, error = %e, "Failed to delete corrupt snapshot");
                }
            }
            Err(e) => tracing::warn!(code = %self.code, error = %e, "Snapshot load failed"),
        }
    }

    async fn handle(&mut self, cmd: LobbyCommand) {
        match cmd {
            LobbyCommand::Join { user_id, conn, respond } => {
                let result = self.handle_join(&user_id, conn).await;
                let _ = respond.send(result);
            }
            LobbyCommand::Leave { user_id, conn_id } => {
                self.handle_leave(&user_id, conn_id).await;
            }
            LobbyCommand::Disconnected { user_id, conn_id } => {
                self.handle_disconnected(&user_id, conn_id).await;
            }
            LobbyCommand::Reconnect { user_id, conn } => {
                self.handle_reconnect(&user_id, conn).await;
            }
            LobbyCommand::SpectatorJoin { conn } => {
                self.handle_spectator_join(conn).await;
            }
            LobbyCommand::SpectatorLeave { conn_id } => {
                self.roster.spectator_detach(conn_id);
            }
            LobbyCommand::GameStart => {
                self.handle_game_start().await;
            }
            LobbyCommand::GameEnd => {
                self.apply(DuelCommand::EndGame).await;
            }
            LobbyCommand::RoundStart => {
                self.apply(DuelCommand::StartRound).await;
                self.maybe_resolve_round().await;
            }
            LobbyCommand::RoundEnd { round } => {
                let round = round.or_else(|| self.game.as_ref().map(|g| g.current_index));
                if let Some(round) = round {
                    self.apply(DuelCommand::EndRound { round }).await;
                }
            }
            LobbyCommand::SubmitGuess { user_id, lat, lon } => {
                self.apply(DuelCommand::SubmitGuess { user_id, lat, lon }).await;
                self.maybe_resolve_round().await;
            }
            LobbyCommand::Chat { user_id, message } => {
                self.handle_chat(&user_id, message).await;
            }
            LobbyCommand::SpectateRelay { num_player, data } => {
                self.roster.broadcast_spectators(&ServerEvent::Spectate { num_player, data });
            }
        }
    }

    // =========================================================================
    // Roster lifecycle
    // =========================================================================

    async fn handle_join(&mut self, user_id: &str, conn: ConnHandle) -> Result<(), JoinError> {
        let lobby = match lobbies::add_user(&self.pool, &self.code, user_id).await {
            Ok(lobbies::JoinOutcome::Joined(lobby))
            | Ok(lobbies::JoinOutcome::AlreadyIn(lobby)) => lobby,
            Ok(lobbies::JoinOutcome::Full) => return Err(JoinError::LobbyFull),
            Ok(lobbies::JoinOutcome::NotFound) => return Err(JoinError::LobbyNotFound),
            Err(e) => {
                tracing::error!(code = %self.code, error = %e, "Join failed");
                return Err(JoinError::Storage);
            }
        };

        // A client may re-announce on its existing connection; don't attach
        // the same connection twice.
        if !self.roster.has_conn(conn.id()) {
            self.roster.attach(user_id, conn);
        }
        self.had_players = true;

        let players = self.player_infos(&lobby.users).await;
        self.roster.broadcast(&ServerEvent::PlayerJoined {
            player: user_id.to_string(),
            host: lobby.host_id,
            players,
        });

        tracing::info!(code = %self.code, user_id, "Player joined");
        Ok(())
    }

    async fn handle_leave(&mut self, user_id: &str, conn_id: Option<u64>) {
        match conn_id {
            Some(id) => self.roster.detach(id),
            None => self.roster.detach_user(user_id),
        }
        self.kick_tasks.cancel(user_id);

        if self.roster.players_empty() {
            // Last one out tears the lobby down.
            if let Some(store) = &self.snapshots
                && let Err(e) = store.delete_game(&self.code).await
            {
                tracing::warn!(code = %self.code, error = %e, "Failed to delete snapshot");
            }
            if let Err(e) = lobbies::delete(&self.pool, &self.code).await {
                tracing::error!(code = %self.code, error = %e, "Failed to delete lobby");
            }
            self.closing = true;
            tracing::info!(code = %self.code, user_id, "Last player left, lobby removed");
            return;
        }

        match lobbies::remove_user(&self.pool, &self.code, user_id).await {
            Ok(Some(lobby)) => {
                let players = self.player_infos(&lobby.users).await;
                self.roster.broadcast(&ServerEvent::PlayerLeft {
                    player: user_id.to_string(),
                    players,
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(code = %self.code, error = %e, "Failed to remove user from lobby")
            }
        }
        tracing::info!(code = %self.code, user_id, "Player left");
    }

    async fn handle_disconnected(&mut self, user_id: &str, _conn_id: u64) {
        if !self.roster.has_user(user_id) {
            return;
        }

        if let Some(store) = &self.snapshots
            && let Err(e) = store.mark_disconnect(&self.code, user_id, now_ms()).await
        {
            tracing::warn!(code = %self.code, user_id, error = %e, "Failed to write disconnect mark");
        }

        self.roster.broadcast_except(
            user_id,
            &ServerEvent::PlayerDisconnected { player: user_id.to_string() },
        );

        let handle = spawn_kick(
            self.code.clone(),
            user_id.to_string(),
            self.snapshots.clone(),
            self.tx.clone(),
        );
        self.kick_tasks.arm(user_id, handle);
        tracing::info!(code = %self.code, user_id, "Player disconnected, grace window armed");
    }

    async fn handle_reconnect(&mut self, user_id: &str, conn: ConnHandle) {
        self.kick_tasks.cancel(user_id);
        if let Some(store) = &self.snapshots
            && let Err(e) = store.clear_disconnect(&self.code, user_id).await
        {
            tracing::warn!(code = %self.code, user_id, error = %e, "Failed to clear disconnect mark");
        }

        self.roster.rebind(user_id, conn);

        let lobby = match lobbies::get_by_code(&self.pool, &self.code).await {
            Ok(Some(lobby)) => lobby,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(code = %self.code, error = %e, "Reconnect lobby lookup failed");
                return;
            }
        };

        let players = self.player_infos(&lobby.users).await;
        let game_state = self.game.as_ref().and_then(|game| reconnect_state(game, user_id));

        self.roster.send_to_user(
            user_id,
            &ServerEvent::ReconnectSuccess { host: lobby.host_id, players, game_state },
        );
        self.roster.broadcast_except(
            user_id,
            &ServerEvent::PlayerReconnected { player: user_id.to_string() },
        );
        tracing::info!(code = %self.code, user_id, "Player reconnected");
    }

    async fn handle_spectator_join(&mut self, conn: ConnHandle) {
        // Replay the current round and roster so the observer can render.
        if let Some(game) = &self.game
            && let Some(location) = game.current_location()
        {
            conn.send(ServerEvent::RoundStarted {
                lat: location.lat,
                lon: location.lon,
                url: location.url.clone(),
                timer: game.timer_secs,
                round_start_time: game.round_start_ms,
            });
        }

        if let Ok(Some(lobby)) = lobbies::get_by_code(&self.pool, &self.code).await {
            let players = self.player_infos(&lobby.users).await;
            conn.send(ServerEvent::PlayerJoined {
                player: lobby.host_id.clone(),
                host: lobby.host_id,
                players,
            });
        }

        self.roster.spectator_attach(conn);
    }

    async fn handle_chat(&self, user_id: &str, message: serde_json::Value) {
        let name = match users::get_by_id(&self.pool, user_id).await {
            Ok(Some(user)) => user.name,
            _ => return,
        };
        self.roster.broadcast(&ServerEvent::Broadcast { player: name, message });
    }

    // =========================================================================
    // Game lifecycle
    // =========================================================================

    async fn handle_game_start(&mut self) {
        if self.game.is_none() {
            let lobby = match lobbies::get_by_code(&self.pool, &self.code).await {
                Ok(Some(lobby)) => lobby,
                Ok(None) => return,
                Err(e) => {
                    tracing::error!(code = %self.code, error = %e, "Game start lobby lookup failed");
                    return;
                }
            };

            let timer = lobby.timer.max(0) as u32;
            let state = match lobby.game_mode() {
                GameMode::Duel => {
                    DuelState::new_duel(lobby.locations.0.clone(), &lobby.users, timer)
                }
                GameMode::ClanWar => DuelState::new_clan_war(
                    lobby.locations.0.clone(),
                    lobby.host_id.clone(),
                    lobby.war_id.clone().unwrap_or_default(),
                    timer,
                ),
            };
            self.game = Some(state);
        }

        // The reducer makes a second start a no-op.
        self.apply(DuelCommand::Start).await;
    }

    /// Run a reducer command, persist the new state, and dispatch its events.
    async fn apply(&mut self, command: DuelCommand) {
        let Some(game) = &self.game else { return };

        let result = reduce(game, command, now_ms());
        if result.has_error() {
            for event in &result.events {
                if let DuelEvent::Error { code, message } = event {
                    tracing::error!(lobby = %self.code, code, message, "Refused game transition");
                }
            }
            return;
        }
        if !result.changed {
            return;
        }

        self.game = Some(result.state);
        self.persist().await;

        for event in result.events {
            self.dispatch(event).await;
        }
    }

    /// Resolve the round early once every expected guess is in.
    async fn maybe_resolve_round(&mut self) {
        let Some(game) = &self.game else { return };
        let round = game.current_index;
        if game.round_complete() && game.round_started(round) && !game.round_ended(round) {
            self.apply(DuelCommand::EndRound { round }).await;
        }
    }

    async fn dispatch(&mut self, event: DuelEvent) {
        match event {
            DuelEvent::GameStarted { hp, timer } => {
                let mode = self
                    .game
                    .as_ref()
                    .filter(|g| g.mode == GameMode::ClanWar)
                    .map(|_| "clan_war".to_string());
                self.roster.broadcast(&ServerEvent::GameStarted { hp, timer, mode });
            }
            DuelEvent::RoundStarted { round, lat, lon, url, timer, started_at_ms } => {
                self.roster.broadcast(&ServerEvent::RoundStarted {
                    lat,
                    lon,
                    url,
                    timer,
                    round_start_time: started_at_ms,
                });
                self.arm_round_timer(round, timer);
                tracing::info!(code = %self.code, round, "Round started");
            }
            DuelEvent::PlayerGuessed { player } => {
                self.roster.broadcast(&ServerEvent::PlayerGuessed { player });
            }
            DuelEvent::RoundTimedOut { hp, num_guesses } => {
                self.roster.broadcast(&ServerEvent::RoundTimedout { hp, num_guesses });
                self.cancel_round_timer();
                self.schedule_next_round();
            }
            DuelEvent::RoundEnded { round, winner, damage, hp, results, lat, lon } => {
                self.roster.broadcast(&ServerEvent::RoundEnded {
                    winner,
                    damage,
                    hp,
                    results,
                    lat,
                    lon,
                });
                self.cancel_round_timer();
                self.schedule_next_round();
                tracing::info!(code = %self.code, round, "Round ended");
            }
            DuelEvent::WarRoundEnded { round, total_score } => {
                self.roster.broadcast(&ServerEvent::WarRoundEnded { total_score, round });
                self.cancel_round_timer();
                self.schedule_next_round();
            }
            DuelEvent::GameEnded { winner, total_distances } => {
                self.cancel_round_timer();
                self.cancel_next_round();
                self.finalize_duel(winner, total_distances).await;
            }
            DuelEvent::WarEnded { war_id, player, total_score } => {
                self.cancel_round_timer();
                self.cancel_next_round();
                self.finalize_war(&war_id, &player, total_score).await;
            }
            DuelEvent::Error { code, message } => {
                tracing::error!(lobby = %self.code, code, message, "Unexpected reducer error");
            }
        }
    }

    // =========================================================================
    // Timers
    // =========================================================================

    fn arm_round_timer(&mut self, round: usize, timer_secs: u32) {
        self.cancel_round_timer();
        let tx = self.tx.clone();
        self.round_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(u64::from(timer_secs))).await;
            let _ = tx.send(LobbyCommand::RoundEnd { round: Some(round) }).await;
        }));
    }

    fn cancel_round_timer(&mut self) {
        if let Some(handle) = self.round_timer.take() {
            handle.abort();
        }
    }

    /// The 5 s inter-round pause, as a cancellable task. A stale firing
    /// no-ops in the reducer via `started_rounds`.
    fn schedule_next_round(&mut self) {
        self.cancel_next_round();
        let tx = self.tx.clone();
        self.next_round_task = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(INTER_ROUND_DELAY_SECS)).await;
            let _ = tx.send(LobbyCommand::RoundStart).await;
        }));
    }

    fn cancel_next_round(&mut self) {
        if let Some(handle) = self.next_round_task.take() {
            handle.abort();
        }
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    async fn finalize_duel(
        &mut self,
        winner: Option<String>,
        total_distances: HashMap<String, f64>,
    ) {
        let Some(game) = self.game.take() else { return };

        let players = self.player_infos(&self.roster.user_ids()).await;
        self.roster.broadcast(&ServerEvent::GameEnded {
            winner: winner.clone(),
            total_distances,
            players,
        });

        let mut participants: Vec<String> = game.hp.keys().cloned().collect();
        participants.sort();

        match users::apply_game_rewards(&self.pool, &participants, winner.as_deref()).await {
            Ok(rank_ups) if !rank_ups.is_empty() => {
                let rank_ups = rank_ups
                    .into_iter()
                    .map(|r| RankUpInfo {
                        user_id: r.user_id,
                        old_rank: r.old_rank,
                        new_rank: r.new_rank,
                    })
                    .collect();
                self.roster.broadcast(&ServerEvent::RankUp { rank_ups });
            }
            Ok(_) => {}
            Err(e) => tracing::error!(code = %self.code, error = %e, "XP reward update failed"),
        }

        self.record_country_stats(&game).await;

        if let Some(store) = &self.snapshots
            && let Err(e) = store.delete_game(&self.code).await
        {
            tracing::warn!(code = %self.code, error = %e, "Failed to delete snapshot");
        }
        if let Err(e) = lobbies::delete(&self.pool, &self.code).await {
            tracing::error!(code = %self.code, error = %e, "Failed to delete lobby row");
        }

        tracing::info!(code = %self.code, winner = ?winner, "Game ended");
    }

    async fn finalize_war(&mut self, war_id: &str, player: &str, total_score: i64) {
        self.game = None;

        if let Err(e) =
            war::submit_score(&self.pool, &self.wars, war_id, player, total_score).await
        {
            tracing::error!(code = %self.code, war_id, error = %e, "War score submission failed");
        }

        if let Some(store) = &self.snapshots
            && let Err(e) = store.delete_game(&self.code).await
        {
            tracing::warn!(code = %self.code, error = %e, "Failed to delete snapshot");
        }
        if let Err(e) = lobbies::delete(&self.pool, &self.code).await {
            tracing::error!(code = %self.code, error = %e, "Failed to delete lobby row");
        }

        tracing::info!(code = %self.code, war_id, total_score, "Clan war lobby finished");
    }

    /// Count close (<= 500 m) and far (> 2000 m) guesses per target country
    /// and fold them into each player's histogram.
    async fn record_country_stats(&self, game: &DuelState) {
        let mut deltas: HashMap<String, HashMap<String, (u32, u32)>> = HashMap::new();

        for guesses in game.guesses.values() {
            for guess in guesses {
                let entry =
                    deltas.entry(guess.player.clone()).or_default().entry(guess.country.clone());
                if guess.distance <= 500.0 {
                    entry.or_default().0 += 1;
                } else if guess.distance > 2000.0 {
                    entry.or_default().1 += 1;
                }
            }
        }

        for (player, per_country) in deltas {
            let user = match users::get_by_id(&self.pool, &player).await {
                Ok(Some(user)) => user,
                _ => continue,
            };

            let mut stats = user.country_stats.0;
            for (country, (close, far)) in per_country {
                let stat = stats.entry(country).or_default();
                stat.close += close;
                stat.far += far;
            }

            if let Err(e) = users::update_country_stats(&self.pool, &player, &stats).await {
                tracing::warn!(code = %self.code, player, error = %e, "Country stats update failed");
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn persist(&self) {
        if let (Some(store), Some(game)) = (&self.snapshots, &self.game)
            && let Err(e) = store.save_game(&self.code, game).await
        {
            tracing::warn!(code = %self.code, error = %e, "Snapshot save failed");
        }
    }

    /// Public profiles for a list of user ids, in the given order.
    async fn player_infos(&self, user_ids: &[String]) -> Vec<PlayerInfo> {
        let rows = match users::get_many(&self.pool, user_ids).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(code = %self.code, error = %e, "Player info lookup failed");
                return Vec::new();
            }
        };

        user_ids
            .iter()
            .filter_map(|id| rows.iter().find(|u| &u.id == id))
            .map(|user| PlayerInfo {
                user_id: user.id.clone(),
                name: user.name.clone(),
                avatar: user.avatar.clone(),
                xp: user.xp,
                rank: user.rank.clone(),
            })
            .collect()
    }
}

/// Build the `reconnect_success` game snapshot for one player.
fn reconnect_state(game: &DuelState, user_id: &str) -> Option<ReconnectGameState> {
    let location = game.current_location()?;

    let elapsed_secs = ((now_ms() - game.round_start_ms) / 1000).max(0) as u32;
    let remaining = game.timer_secs.saturating_sub(elapsed_secs);

    Some(ReconnectGameState {
        current_location_index: game.current_index,
        locations: ReconnectLocation {
            lat: location.lat,
            lon: location.lon,
            url: location.url.clone(),
        },
        roundstart_time: game.round_start_ms,
        timer: remaining,
        hp: game.hp.clone(),
        player_has_guessed: game.has_guessed(user_id),
        player_guess: game.current_guesses().iter().map(|g| g.player.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mistduel_core::duel::RoundLocation;

    fn game_with_round() -> DuelState {
        let locations = vec![RoundLocation {
            lat: 48.8566,
            lon: 2.3522,
            region: "Europe".into(),
            country: "France".into(),
            url: "https://www.google.com/maps/@48.8566,2.3522,17z".into(),
        }];
        let state =
            DuelState::new_duel(locations, &["usr_a".to_string(), "usr_b".to_string()], 240);
        let state = reduce(&state, DuelCommand::Start, 0).state;
        reduce(&state, DuelCommand::StartRound, now_ms()).state
    }

    #[test]
    fn test_reconnect_state_reports_remaining_timer_and_guessers() {
        let state = game_with_round();
        let state = reduce(
            &state,
            DuelCommand::SubmitGuess { user_id: "usr_a".into(), lat: 1.0, lon: 2.0 },
            now_ms(),
        )
        .state;

        let snapshot = reconnect_state(&state, "usr_a").unwrap();
        assert!(snapshot.player_has_guessed);
        assert_eq!(snapshot.player_guess, vec!["usr_a"]);
        assert_eq!(snapshot.roundstart_time, state.round_start_ms);
        // The round just started, so nearly the whole timer remains.
        assert!(snapshot.timer > 230 && snapshot.timer <= 240);

        let other = reconnect_state(&state, "usr_b").unwrap();
        assert!(!other.player_has_guessed);
    }

    #[test]
    fn test_join_error_close_reasons() {
        assert_eq!(JoinError::LobbyFull.close_reason(), "Lobby is full");
        assert_eq!(JoinError::LobbyNotFound.close_reason(), "Lobby not found");
    }
}
