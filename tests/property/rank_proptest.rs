//! Property-based tests for leaderboard ranks

use proptest::prelude::*;
use stride::backend::gamification::rules::competition_ranks;

fn sorted_scores() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..50, 0..40).prop_map(|mut scores| {
        scores.sort_unstable_by(|a, b| b.cmp(a));
        scores
    })
}

proptest! {
    #[test]
    fn test_ties_share_a_rank(scores in sorted_scores()) {
        let ranks = competition_ranks(&scores);
        prop_assert_eq!(ranks.len(), scores.len());
        for i in 1..scores.len() {
            if scores[i] == scores[i - 1] {
                prop_assert_eq!(ranks[i], ranks[i - 1]);
            } else {
                // the next rank skips past every tied entry
                prop_assert_eq!(ranks[i], i as i64 + 1);
            }
        }
    }

    #[test]
    fn test_first_rank_is_one(scores in sorted_scores()) {
        let ranks = competition_ranks(&scores);
        if let Some(first) = ranks.first() {
            prop_assert_eq!(*first, 1);
        }
        prop_assert!(ranks.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
