//! Read-through caches

pub mod leaderboard;
