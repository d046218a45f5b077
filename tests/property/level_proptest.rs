//! Property-based tests for points, levels and badge levels

use proptest::prelude::*;
use stride::backend::gamification::rules::{
    badge_level, level_for_points, points_for_level, thresholds_valid,
};

fn increasing_thresholds() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1i64..1_000, 1..8).prop_map(|steps| {
        steps
            .into_iter()
            .scan(0i64, |total, step| {
                *total += step;
                Some(*total)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn test_level_never_decreases(a in 0i64..10_000_000, b in 0i64..10_000_000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(level_for_points(low) <= level_for_points(high));
    }

    #[test]
    fn test_level_starts_at_its_threshold(level in 1i64..200) {
        let start = points_for_level(level);
        prop_assert_eq!(level_for_points(start), level);
        if start > 0 {
            prop_assert_eq!(level_for_points(start - 1), level - 1);
        }
    }

    #[test]
    fn test_badge_level_bounded(thresholds in increasing_thresholds(), value in -10i64..10_000) {
        prop_assert!(thresholds_valid(&thresholds));
        let level = badge_level(&thresholds, value);
        prop_assert!(level >= 0 && level <= thresholds.len() as i64);
        if level > 0 {
            prop_assert!(thresholds[level as usize - 1] <= value);
        }
        if (level as usize) < thresholds.len() {
            prop_assert!(thresholds[level as usize] > value);
        }
    }

    #[test]
    fn test_unsorted_thresholds_rejected(mut thresholds in increasing_thresholds()) {
        prop_assume!(thresholds.len() >= 2);
        thresholds.reverse();
        prop_assert!(!thresholds_valid(&thresholds));
    }
}
