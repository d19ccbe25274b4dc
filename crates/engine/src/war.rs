//! Clan War Controller
//!
//! A war is five parallel solo-score duels between two clans. Rosters of
//! five per side are zipped by descending XP into pairs; each pair plays a
//! clan-war lobby, and the per-lobby engine reports its solo score back here.
//! Score submissions are serialized per war id - both members of a pair
//! finishing near-simultaneously must not lose an update.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use mistduel_core::duel::rules::{CLAN_WAR_TIMER_SECS, LOBBY_LOCATIONS, WAR_ROSTER_SIZE};
use mistduel_db::clans::status;
use mistduel_db::{ClanWar, DbPool, WarPair, WarParticipants, clans, lobbies, users};
use mistduel_locations::{LocationError, LocationProvider};

const WINNER_REPUTATION: i32 = 10;
const WINNER_XP: i32 = 50;
const LOSER_REPUTATION: i32 = -5;
const LOSER_XP: i32 = 10;
/// Refusing a war costs more than losing one.
const DECLAIM_LOSER_REPUTATION: i32 = -10;
const DECLAIM_LOSER_XP: i32 = -25;

#[derive(Debug, thiserror::Error)]
pub enum WarError {
    #[error("War not found")]
    WarNotFound,

    #[error("War pairs not created yet; both clans must set participants first")]
    PairsNotReady,

    #[error("Clan is not a participant of this war")]
    NotAParticipant,

    #[error("User is not in this war")]
    NotInWar,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Location provider error: {0}")]
    Locations(#[from] LocationError),
}

/// Per-war submission locks.
#[derive(Clone, Default)]
pub struct WarRegistry {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl WarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, war_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(war_id.to_string()).or_default())
    }
}

/// Sort each roster by XP descending (ties by id) and zip into pairs.
pub fn build_pairs(
    clan_1: &[String],
    clan_2: &[String],
    xp: &HashMap<String, i32>,
) -> (Vec<String>, Vec<String>, Vec<WarPair>) {
    let sorted = |ids: &[String]| {
        let mut ids = ids.to_vec();
        ids.sort_by(|a, b| {
            xp.get(b).unwrap_or(&0).cmp(xp.get(a).unwrap_or(&0)).then_with(|| a.cmp(b))
        });
        ids
    };

    let clan_1 = sorted(clan_1);
    let clan_2 = sorted(clan_2);
    let pairs = clan_1
        .iter()
        .zip(&clan_2)
        .map(|(p1, p2)| WarPair {
            clan_1: p1.clone(),
            clan_2: p2.clone(),
            status: status::PENDING.to_string(),
            clan_1_score: None,
            clan_2_score: None,
            lobby_code: None,
            winner: None,
        })
        .collect();

    (clan_1, clan_2, pairs)
}

/// Settle a pair once both scores are in. Returns whether the first clan's
/// member won; a score tie goes to `clan_1`.
pub fn decide_pair(pair: &mut WarPair) -> Option<bool> {
    let (Some(score_1), Some(score_2)) = (pair.clan_1_score, pair.clan_2_score) else {
        return None;
    };

    let first_won = score_1 >= score_2;
    pair.winner =
        Some(if first_won { pair.clan_1.clone() } else { pair.clan_2.clone() });
    pair.status = status::COMPLETED.to_string();
    Some(first_won)
}

/// Store a clan's roster; once both sides have five, build the bracket and
/// mark the war ongoing. Pair creation happens exactly once.
pub async fn set_participants(
    pool: &DbPool,
    wars: &WarRegistry,
    war_id: &str,
    clan_id: &str,
    players: Vec<String>,
) -> Result<ClanWar, WarError> {
    let lock = wars.lock_for(war_id).await;
    let _guard = lock.lock().await;

    let war = clans::get_war(pool, war_id).await?.ok_or(WarError::WarNotFound)?;
    let mut participants = war.participants.0.clone();

    if clan_id == war.clan_1_id {
        participants.clan_1 = players;
    } else if clan_id == war.clan_2_id {
        participants.clan_2 = players;
    } else {
        return Err(WarError::NotAParticipant);
    }

    let rosters_complete = participants.clan_1.len() == WAR_ROSTER_SIZE
        && participants.clan_2.len() == WAR_ROSTER_SIZE;

    if rosters_complete && participants.pairs.is_empty() {
        let mut all = participants.clan_1.clone();
        all.extend(participants.clan_2.iter().cloned());
        let xp: HashMap<String, i32> =
            users::get_many(pool, &all).await?.into_iter().map(|u| (u.id, u.xp)).collect();

        let (clan_1, clan_2, pairs) = build_pairs(&participants.clan_1, &participants.clan_2, &xp);
        participants = WarParticipants { clan_1, clan_2, pairs };

        clans::update_participants(pool, war_id, &participants).await?;
        clans::mark_started(pool, war_id).await?;
        tracing::info!(war_id, "War bracket created");
    } else {
        clans::update_participants(pool, war_id, &participants).await?;
    }

    clans::get_war(pool, war_id).await?.ok_or(WarError::WarNotFound)
}

/// Get (or lazily create) the clan-war lobby for the pair containing `user_id`.
pub async fn play_war(
    pool: &DbPool,
    wars: &WarRegistry,
    provider: &LocationProvider,
    war_id: &str,
    user_id: &str,
) -> Result<String, WarError> {
    let lock = wars.lock_for(war_id).await;
    let _guard = lock.lock().await;

    let war = clans::get_war(pool, war_id).await?.ok_or(WarError::WarNotFound)?;
    let mut participants = war.participants.0.clone();

    if participants.pairs.is_empty() {
        return Err(WarError::PairsNotReady);
    }

    let pair = participants
        .pairs
        .iter_mut()
        .find(|p| p.clan_1 == user_id || p.clan_2 == user_id)
        .ok_or(WarError::NotInWar)?;

    if let Some(code) = &pair.lobby_code {
        return Ok(code.clone());
    }

    let locations = provider.random_locations(LOBBY_LOCATIONS).await?;
    let lobby = lobbies::create(
        pool,
        user_id,
        locations,
        CLAN_WAR_TIMER_SECS as i32,
        Some("clan_war"),
        Some(war_id),
    )
    .await?;

    pair.lobby_code = Some(lobby.invite_code.clone());
    pair.status = status::ONGOING.to_string();
    clans::update_participants(pool, war_id, &participants).await?;

    tracing::info!(war_id, user_id, code = %lobby.invite_code, "War lobby created");
    Ok(lobby.invite_code)
}

/// Record one side's solo score. When its pair completes, bump the clan
/// aggregate; when every pair has completed, finish the war.
pub async fn submit_score(
    pool: &DbPool,
    wars: &WarRegistry,
    war_id: &str,
    user_id: &str,
    score: i64,
) -> Result<(), WarError> {
    let lock = wars.lock_for(war_id).await;
    let _guard = lock.lock().await;

    let war = clans::get_war(pool, war_id).await?.ok_or(WarError::WarNotFound)?;
    let mut participants = war.participants.0.clone();

    let pair = participants
        .pairs
        .iter_mut()
        .find(|p| p.clan_1 == user_id || p.clan_2 == user_id)
        .ok_or(WarError::NotInWar)?;

    // A settled pair stays settled; a resubmission must not double-count.
    if pair.status == status::COMPLETED {
        return Ok(());
    }

    if pair.clan_1 == user_id {
        pair.clan_1_score = Some(score);
    } else {
        pair.clan_2_score = Some(score);
    }

    if let Some(first_won) = decide_pair(pair) {
        clans::increment_war_score(pool, war_id, first_won).await?;
    }
    clans::update_participants(pool, war_id, &participants).await?;
    tracing::info!(war_id, user_id, score, "War score recorded");

    let all_done = participants.pairs.iter().all(|p| p.status == status::COMPLETED);
    if all_done {
        finish_war(pool, war_id).await?;
    }
    Ok(())
}

/// Close a completed war: pick the aggregate winner and pay out.
async fn finish_war(pool: &DbPool, war_id: &str) -> Result<(), WarError> {
    let war = clans::get_war(pool, war_id).await?.ok_or(WarError::WarNotFound)?;

    let (winner, loser) = if war.clan_1_score > war.clan_2_score {
        (war.clan_1_id.clone(), war.clan_2_id.clone())
    } else {
        (war.clan_2_id.clone(), war.clan_1_id.clone())
    };

    clans::finalize_war(pool, war_id, &winner, status::COMPLETED).await?;
    clans::apply_war_reward(pool, &winner, WINNER_REPUTATION, WINNER_XP, true).await?;
    clans::apply_war_reward(pool, &loser, LOSER_REPUTATION, LOSER_XP, false).await?;

    tracing::info!(war_id, winner, "War completed");
    Ok(())
}

/// Accept a declared war.
pub async fn accept_war(pool: &DbPool, war_id: &str) -> Result<(), WarError> {
    clans::get_war(pool, war_id).await?.ok_or(WarError::WarNotFound)?;
    clans::mark_started(pool, war_id).await?;
    Ok(())
}

/// Refuse a war: the attacker wins by forfeit and the refusing clan takes
/// the harsher penalty.
pub async fn declaim_war(pool: &DbPool, war_id: &str) -> Result<(), WarError> {
    let war = clans::get_war(pool, war_id).await?.ok_or(WarError::WarNotFound)?;

    clans::finalize_war(pool, war_id, &war.clan_1_id, status::DECLAIMED).await?;
    clans::apply_war_reward(pool, &war.clan_1_id, WINNER_REPUTATION, WINNER_XP, true).await?;
    clans::apply_war_reward(
        pool,
        &war.clan_2_id,
        DECLAIM_LOSER_REPUTATION,
        DECLAIM_LOSER_XP,
        false,
    )
    .await?;

    tracing::info!(war_id, winner = %war.clan_1_id, "War declaimed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(prefix: &str) -> Vec<String> {
        (0..5).map(|i| format!("usr_{prefix}{i}")).collect()
    }

    fn xp_map(pairs: &[(&str, i32)]) -> HashMap<String, i32> {
        pairs.iter().map(|(id, xp)| (id.to_string(), *xp)).collect()
    }

    #[test]
    fn test_pairs_zip_by_descending_xp() {
        let clan_1 = roster("a");
        let clan_2 = roster("b");
        let xp = xp_map(&[
            ("usr_a0", 100),
            ("usr_a1", 900),
            ("usr_a2", 500),
            ("usr_a3", 300),
            ("usr_a4", 700),
            ("usr_b0", 50),
            ("usr_b1", 950),
            ("usr_b2", 550),
            ("usr_b3", 350),
            ("usr_b4", 750),
        ]);

        let (sorted_1, sorted_2, pairs) = build_pairs(&clan_1, &clan_2, &xp);

        assert_eq!(sorted_1, vec!["usr_a1", "usr_a4", "usr_a2", "usr_a3", "usr_a0"]);
        assert_eq!(sorted_2, vec!["usr_b1", "usr_b4", "usr_b2", "usr_b3", "usr_b0"]);
        assert_eq!(pairs.len(), 5);
        // Strongest faces strongest.
        assert_eq!(pairs[0].clan_1, "usr_a1");
        assert_eq!(pairs[0].clan_2, "usr_b1");
        assert!(pairs.iter().all(|p| p.status == status::PENDING));
        assert!(pairs.iter().all(|p| p.lobby_code.is_none()));
    }

    #[test]
    fn test_pair_sides_are_disjoint() {
        let clan_1 = roster("a");
        let clan_2 = roster("b");
        let (_, _, pairs) = build_pairs(&clan_1, &clan_2, &HashMap::new());

        for pair in &pairs {
            assert_ne!(pair.clan_1, pair.clan_2);
            assert!(clan_1.contains(&pair.clan_1));
            assert!(clan_2.contains(&pair.clan_2));
        }
    }

    #[test]
    fn test_decide_pair_waits_for_both_scores() {
        let (_, _, mut pairs) = build_pairs(&roster("a"), &roster("b"), &HashMap::new());
        let pair = &mut pairs[0];

        pair.clan_1_score = Some(4000);
        assert_eq!(decide_pair(pair), None);
        assert_eq!(pair.status, status::PENDING);

        pair.clan_2_score = Some(3500);
        assert_eq!(decide_pair(pair), Some(true));
        assert_eq!(pair.status, status::COMPLETED);
        assert_eq!(pair.winner.as_deref(), Some(pair.clan_1.as_str()));
    }

    #[test]
    fn test_pair_score_tie_goes_to_clan_1() {
        let (_, _, mut pairs) = build_pairs(&roster("a"), &roster("b"), &HashMap::new());
        let pair = &mut pairs[0];

        pair.clan_1_score = Some(4000);
        pair.clan_2_score = Some(4000);
        assert_eq!(decide_pair(pair), Some(true));
        assert_eq!(pair.winner.as_deref(), Some(pair.clan_1.as_str()));
    }
}
