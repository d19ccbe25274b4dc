//! Round scoring
//!
//! Points decay exponentially with distance. The decay constant calibrates
//! the HP model: a perfect guess against a miss of ~350 km deals roughly
//! half a player's starting HP, so games resolve in a handful of rounds.

/// Maximum points for a perfect guess.
pub const MAX_POINTS: i32 = 5000;

/// Per-kilometer decay factor.
const DECAY_PER_KM: f64 = 0.998036;

/// Points for a guess at the given distance from the target, in meters.
///
/// `round(5000 * 0.998036^(distance_km))` - monotonically decreasing,
/// 5000 at zero distance, asymptotically 0.
pub fn points(distance_meters: f64) -> i32 {
    let distance_km = distance_meters / 1000.0;
    (f64::from(MAX_POINTS) * DECAY_PER_KM.powf(distance_km)).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_guess() {
        assert_eq!(points(0.0), 5000);
    }

    #[test]
    fn test_antipodal_guess_scores_nothing() {
        // Half the Earth's circumference away
        assert_eq!(points(20_015_000.0), 0);
    }

    #[test]
    fn test_monotonically_decreasing() {
        let distances =
            [0.0, 500.0, 2_000.0, 47_000.0, 350_000.0, 1_000_000.0, 5_000_000.0, 20_000_000.0];
        for pair in distances.windows(2) {
            assert!(
                points(pair[0]) >= points(pair[1]),
                "points({}) < points({})",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_city_scale_miss() {
        // ~47 km off (Paris center vs. its far suburbs) still scores high
        let p = points(47_400.0);
        assert!((4500..4600).contains(&p), "got {p}");
    }

    #[test]
    fn test_half_hp_calibration() {
        // A ~353 km miss against a perfect guess costs about half of 6000 HP
        let damage = MAX_POINTS - points(353_000.0);
        assert!((2400..2700).contains(&damage), "got {damage}");
    }
}
