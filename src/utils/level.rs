// Level calculation system
// Level is a pure function of cumulative XP and is never stored as ground truth

/// Calculate the level for a given amount of total XP.
/// Level 1 starts at 0 XP; each level requires quadratically more.
pub fn calculate_level(total_xp: i64) -> i64 {
    let xp = total_xp.max(0) as f64;
    (xp / 100.0).sqrt().floor() as i64 + 1
}

/// XP threshold at which the given level ends.
pub fn xp_for_next_level(level: i64) -> i64 {
    level * level * 100
}

/// Result of reconciling a stored level against freshly recomputed XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub old_level: i64,
    pub new_level: i64,
}

/// Recompute the level from `total_xp` and decide whether the stored level
/// should be patched. Levels only ever move up; a recomputed level at or
/// below the stored one leaves the document untouched.
pub fn reconcile_level(total_xp: i64, stored_level: i64) -> Option<LevelUp> {
    let new_level = calculate_level(total_xp);
    if new_level > stored_level {
        Some(LevelUp {
            old_level: stored_level,
            new_level,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_floor() {
        assert_eq!(calculate_level(0), 1);
        assert_eq!(calculate_level(99), 1);
        assert_eq!(calculate_level(100), 2);
        assert_eq!(calculate_level(250), 2);
        assert_eq!(calculate_level(400), 3);
    }

    #[test]
    fn test_level_monotonic() {
        let mut prev = 0;
        for xp in (0..10_000i64).step_by(37) {
            let level = calculate_level(xp);
            assert!(level >= 1);
            assert!(level >= prev);
            prev = level;
        }
    }

    #[test]
    fn test_xp_threshold() {
        assert_eq!(xp_for_next_level(1), 100);
        assert_eq!(xp_for_next_level(2), 400);
        assert_eq!(xp_for_next_level(5), 2500);
    }

    #[test]
    fn test_threshold_round_trip() {
        // Threshold for the level at a given XP never decreases as XP grows
        let mut prev = 0;
        for xp in (0..10_000i64).step_by(100) {
            let threshold = xp_for_next_level(calculate_level(xp));
            assert!(threshold >= prev);
            prev = threshold;
        }
    }

    #[test]
    fn test_reconcile_level_up() {
        let up = reconcile_level(250, 1).expect("should level up");
        assert_eq!(up.old_level, 1);
        assert_eq!(up.new_level, 2);
    }

    #[test]
    fn test_reconcile_no_change() {
        assert_eq!(reconcile_level(250, 2), None);
        // Levels never decrease even if XP would imply a lower one
        assert_eq!(reconcile_level(50, 3), None);
    }
}
