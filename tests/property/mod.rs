mod level_proptest;
mod paging_proptest;
mod rank_proptest;
mod streak_proptest;
