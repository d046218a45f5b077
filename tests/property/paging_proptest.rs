//! Property-based tests for pagination and goal progress

use proptest::prelude::*;
use stride::shared::goals::compute_progress;
use stride::shared::Page;

proptest! {
    #[test]
    fn test_page_is_always_in_bounds(page in any::<Option<i64>>(), limit in any::<Option<i64>>()) {
        let page = Page::new(page, limit);
        prop_assert!(page.page >= 1);
        prop_assert!(page.limit >= 1 && page.limit <= 100);
        prop_assert!(page.offset() >= 0);
    }

    #[test]
    fn test_progress_is_a_percentage(completed in -5i64..500, total in -5i64..500) {
        let progress = compute_progress(completed, total);
        prop_assert!((0..=100).contains(&progress));
        if total > 0 && completed >= total {
            prop_assert_eq!(progress, 100);
        }
        if total <= 0 {
            prop_assert_eq!(progress, 0);
        }
    }
}
