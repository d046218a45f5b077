/**
 * Gamification Rules
 *
 * Pure arithmetic for levels, streaks, badge levels and leaderboard ranks.
 * Nothing here touches the database.
 */

use chrono::NaiveDate;

pub const TASK_POINTS: i64 = 5;
pub const MILESTONE_POINTS: i64 = 20;
pub const GOAL_POINTS: i64 = 100;
pub const POST_PUBLISHED_POINTS: i64 = 10;
pub const COMMENT_POINTS: i64 = 2;
pub const CHECK_IN_POINTS: i64 = 5;

/// Streak fed by logins and every gamified action
pub const DAILY_STREAK: &str = "daily";
/// Streak fed only by explicit check-ins
pub const CHECK_IN_STREAK: &str = "check_in";

fn isqrt(n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    let mut x = (n as f64).sqrt() as i64;
    while x.checked_mul(x).map_or(true, |sq| sq > n) {
        x -= 1;
    }
    while (x + 1).checked_mul(x + 1).is_some_and(|sq| sq <= n) {
        x += 1;
    }
    x
}

/// `1 + floor(sqrt(points / 100))`
pub fn level_for_points(points: i64) -> i64 {
    // floor(sqrt(p) / 10) == floor(isqrt(p) / 10)
    1 + isqrt(points) / 10
}

/// Points total at which `level` starts
pub fn points_for_level(level: i64) -> i64 {
    let steps = (level - 1).max(0);
    100 * steps * steps
}

/// Stored streak state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    pub current: i64,
    pub longest: i64,
    pub last_date: Option<NaiveDate>,
}

impl StreakState {
    pub const EMPTY: StreakState = StreakState {
        current: 0,
        longest: 0,
        last_date: None,
    };
}

/// Apply activity on `today`
///
/// Returns the new state and whether anything changed (false when activity
/// was already recorded today).
pub fn advance_streak(state: StreakState, today: NaiveDate) -> (StreakState, bool) {
    let current = match state.last_date {
        Some(last) if last == today => return (state, false),
        Some(last) if today.pred_opt() == Some(last) => state.current + 1,
        _ => 1,
    };
    let next = StreakState {
        current,
        longest: state.longest.max(current),
        last_date: Some(today),
    };
    (next, true)
}

/// Current count as seen on `today`; a gap of more than one day breaks it
pub fn effective_current(state: StreakState, today: NaiveDate) -> i64 {
    match state.last_date {
        Some(last) if last == today || today.pred_opt() == Some(last) => state.current,
        _ => 0,
    }
}

/// Number of thresholds reached by `value`
pub fn badge_level(thresholds: &[i64], value: i64) -> i64 {
    thresholds.iter().filter(|t| **t <= value).count() as i64
}

/// Thresholds must be non-empty, positive and strictly increasing
pub fn thresholds_valid(thresholds: &[i64]) -> bool {
    !thresholds.is_empty()
        && thresholds[0] > 0
        && thresholds.windows(2).all(|pair| pair[0] < pair[1])
}

/// Competition ranks ("1224") for scores already sorted descending
pub fn competition_ranks(sorted_scores: &[i64]) -> Vec<i64> {
    let mut ranks = Vec::with_capacity(sorted_scores.len());
    for (i, score) in sorted_scores.iter().enumerate() {
        let rank = if i > 0 && sorted_scores[i - 1] == *score {
            ranks[i - 1]
        } else {
            i as i64 + 1
        };
        ranks.push(rank);
    }
    ranks
}
