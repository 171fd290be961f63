//! High score leaderboard
//!
//! Keeps each player's best score, top 10, in memory.

use serde::Serialize;

use crate::catalog::PlayerId;

/// Maximum number of entries to keep
pub const MAX_LEADERBOARD_ENTRIES: usize = 10;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub user: PlayerId,
    pub score: u64,
    /// Unix timestamp (ms) when achieved
    pub timestamp: u64,
}

/// Best-per-player top-10 table, sorted descending by score.
/// Equal scores keep submission order.
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score would make it onto the board
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_LEADERBOARD_ENTRIES {
            return true;
        }
        // Must beat the lowest entry; ties lose to the earlier submission
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Current 1-indexed rank of a player, if on the board
    pub fn rank_of(&self, user: &PlayerId) -> Option<usize> {
        self.entries.iter().position(|e| &e.user == user).map(|i| i + 1)
    }

    /// Submit a score.
    ///
    /// A player keeps only their best entry: a lower or equal resubmission
    /// changes nothing. Returns the player's rank afterwards (1-indexed) or
    /// None if they are not on the board.
    pub fn submit(&mut self, user: PlayerId, score: u64, timestamp: u64) -> Option<usize> {
        if let Some(rank) = self.rank_of(&user) {
            if score <= self.entries[rank - 1].score {
                return Some(rank);
            }
            self.entries.remove(rank - 1);
        } else if !self.qualifies(score) {
            return None;
        }

        let entry = LeaderboardEntry {
            user,
            score,
            timestamp,
        };

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        // Trim to max size
        self.entries.truncate(MAX_LEADERBOARD_ENTRIES);
        log::info!("Score submitted: rank {rank} with {score}");

        Some(rank)
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
