// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Winner computation (§4.5): a pure function over a leaderboard, grounded
//! on `original_source`'s `Repository.get_winners` ordering (`score` desc,
//! `total_time` asc). `StorageRepository::leaderboard` already returns rows
//! in this order; this module just slices the top-3 view and builds the
//! per-participant personalization map the Broadcast Projector needs for END
//! and DISCUSSION payloads.

use std::collections::HashMap;

use livequiz_core::{LeaderboardEntry, UserId};

/// One participant's own standing, attached to their personalized END/
/// DISCUSSION payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnStanding {
    pub position: usize,
    pub score: i64,
    pub total_time: i64,
}

/// Takes the top `n` entries of an already-ordered leaderboard.
pub fn top_n(leaderboard: &[LeaderboardEntry], n: usize) -> Vec<LeaderboardEntry> {
    leaderboard.iter().take(n).cloned().collect()
}

/// Builds a `user_id -> OwnStanding` map from the full (already-ordered)
/// leaderboard, 1-based position. Built once per broadcast and reused for
/// every participant, per §4.3's "fetch aggregates at most once" invariant.
pub fn own_standings(leaderboard: &[LeaderboardEntry]) -> HashMap<UserId, OwnStanding> {
    leaderboard
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            (
                entry.user_id,
                OwnStanding {
                    position: idx + 1,
                    score: entry.score,
                    total_time: entry.total_time,
                },
            )
        })
        .collect()
}
