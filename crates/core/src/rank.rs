//! Player rank ladder
//!
//! Ranks are derived from XP: the highest threshold less than or equal to the
//! player's XP wins. The table is ordered by ascending threshold.

/// `(inclusive lower XP bound, rank name)` in ascending order.
pub const RANKS: [(i32, &str); 9] = [
    (0, "Ashborn"),
    (100, "Fog Runner"),
    (300, "Tin Sight"),
    (600, "Brass Deceiver"),
    (1000, "Steel Pusher"),
    (1600, "Iron Puller"),
    (2500, "Atium Shadow"),
    (4000, "Mistborn"),
    (6500, "Lord Mistborn"),
];

/// Rank every new player starts at.
pub const DEFAULT_RANK: &str = RANKS[0].1;

/// Resolve the rank name for an XP value.
pub fn rank_for_xp(xp: i32) -> &'static str {
    RANKS
        .iter()
        .rev()
        .find(|(threshold, _)| xp >= *threshold)
        .map(|(_, name)| *name)
        .unwrap_or(DEFAULT_RANK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_inclusive() {
        assert_eq!(rank_for_xp(0), "Ashborn");
        assert_eq!(rank_for_xp(99), "Ashborn");
        assert_eq!(rank_for_xp(100), "Fog Runner");
        assert_eq!(rank_for_xp(6500), "Lord Mistborn");
        assert_eq!(rank_for_xp(1_000_000), "Lord Mistborn");
    }

    #[test]
    fn test_negative_xp_falls_back_to_first_rank() {
        assert_eq!(rank_for_xp(-50), "Ashborn");
    }

    #[test]
    fn test_every_threshold_maps_to_its_own_rank() {
        for (threshold, name) in RANKS {
            assert_eq!(rank_for_xp(threshold), name);
            assert_eq!(rank_for_xp(threshold + 1), name);
        }
    }

    #[test]
    fn test_win_reward_crosses_first_threshold() {
        // 95 XP + 50 (win) + 10 (participation) lands in Fog Runner
        assert_eq!(rank_for_xp(95), "Ashborn");
        assert_eq!(rank_for_xp(95 + 50), "Fog Runner");
    }
}
