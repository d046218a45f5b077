//! Property-based tests for streak bookkeeping

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use stride::backend::gamification::rules::{advance_streak, effective_current, StreakState};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

proptest! {
    #[test]
    fn test_consecutive_days_count_up(days in 1i64..400) {
        let mut state = StreakState::EMPTY;
        for offset in 0..days {
            let (next, changed) = advance_streak(state, start() + Duration::days(offset));
            prop_assert!(changed);
            state = next;
        }
        prop_assert_eq!(state.current, days);
        prop_assert_eq!(state.longest, days);
    }

    #[test]
    fn test_same_day_is_idempotent(offset in 0i64..1_000) {
        let today = start() + Duration::days(offset);
        let (once, _) = advance_streak(StreakState::EMPTY, today);
        let (twice, changed) = advance_streak(once, today);
        prop_assert!(!changed);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_longest_is_never_below_current(gaps in prop::collection::vec(1i64..4, 1..60)) {
        let mut state = StreakState::EMPTY;
        let mut day = start();
        for gap in gaps {
            day += Duration::days(gap);
            state = advance_streak(state, day).0;
            prop_assert!(state.longest >= state.current);
            prop_assert!(state.current >= 1);
        }
    }

    #[test]
    fn test_gap_breaks_effective_count(current in 1i64..100, gap in 2i64..30) {
        let state = StreakState {
            current,
            longest: current,
            last_date: Some(start()),
        };
        prop_assert_eq!(effective_current(state, start() + Duration::days(1)), current);
        prop_assert_eq!(effective_current(state, start() + Duration::days(gap)), 0);
    }
}
