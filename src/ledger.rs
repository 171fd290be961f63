//! Pending-token ledger
//!
//! Per-player counts of collected-but-unclaimed tokens. In-memory only; the
//! ledger is lost on restart.
//!
//! Each player has their own lock, so concurrent collections from one player
//! are serialized and different players never contend beyond the brief map
//! lookup.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::catalog::{PlayerId, TokenTypeId};

/// One `(player, token type)` aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingEntry {
    pub user: PlayerId,
    pub token_type: TokenTypeId,
    pub count: u32,
}

type PlayerCounts = BTreeMap<TokenTypeId, u32>;

/// One player's counts plus the lock that serializes their claims
#[derive(Debug, Default)]
struct PlayerSlot {
    counts: Mutex<PlayerCounts>,
    claim: Mutex<()>,
}

#[derive(Debug, Default)]
pub struct PendingLedger {
    players: RwLock<HashMap<PlayerId, Arc<PlayerSlot>>>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn player_slot(&self, player: &PlayerId) -> Arc<PlayerSlot> {
        if let Some(slot) = self.players.read().get(player) {
            return Arc::clone(slot);
        }
        let mut players = self.players.write();
        Arc::clone(players.entry(player.clone()).or_default())
    }

    fn existing_slot(&self, player: &PlayerId) -> Option<Arc<PlayerSlot>> {
        self.players.read().get(player).cloned()
    }

    /// Drop an empty slot nobody else holds.
    ///
    /// Clones are only handed out under the map lock, so a count of one under
    /// the write lock means no collection or claim can still reach the slot.
    fn prune(&self, player: &PlayerId) {
        let mut players = self.players.write();
        let idle = players
            .get(player)
            .is_some_and(|slot| Arc::strong_count(slot) == 1 && slot.counts.lock().is_empty());
        if idle {
            players.remove(player);
        }
    }

    /// Add one collected token. Not idempotent: every call increments.
    pub fn record_collection(&self, player: &PlayerId, token_type: TokenTypeId) -> u32 {
        let slot = self.player_slot(player);
        let mut counts = slot.counts.lock();
        let count = counts.entry(token_type).or_insert(0);
        *count += 1;
        log::info!("Collected token {token_type} for user {player}");
        *count
    }

    /// All pending entries for a player, sorted by token type
    pub fn list_pending(&self, player: &PlayerId) -> Vec<PendingEntry> {
        let Some(slot) = self.existing_slot(player) else {
            return Vec::new();
        };
        snapshot(player, &slot.counts.lock())
    }

    /// Remove every entry for a player. Returns how many entries were removed.
    pub fn clear(&self, player: &PlayerId) -> usize {
        let Some(slot) = self.existing_slot(player) else {
            log::info!("Cleared 0 tokens for user {player}");
            return 0;
        };
        let removed = {
            let mut counts = slot.counts.lock();
            let removed = counts.len();
            counts.clear();
            removed
        };
        drop(slot);
        self.prune(player);
        log::info!("Cleared {removed} tokens for user {player}");
        removed
    }

    /// Subtract exactly the given counts after a successful claim.
    ///
    /// Collections that arrived after the claim snapshot stay pending.
    /// Counts never go below zero; emptied entries are removed.
    pub fn settle(&self, player: &PlayerId, claimed: &[PendingEntry]) {
        let Some(slot) = self.existing_slot(player) else {
            return;
        };
        settle_counts(player, &mut slot.counts.lock(), claimed);
        drop(slot);
        self.prune(player);
    }

    /// Hand a player's pending tokens to `f` and settle them if it succeeds.
    ///
    /// Hand-offs for one player are serialized: a second caller waits, then
    /// sees only what the first left pending. `f` is not called when nothing
    /// is pending.
    pub fn hand_off<E>(
        &self,
        player: &PlayerId,
        f: impl FnOnce(&[PendingEntry]) -> Result<(), E>,
    ) -> Result<Vec<PendingEntry>, E> {
        let Some(slot) = self.existing_slot(player) else {
            return Ok(Vec::new());
        };
        let outcome = {
            let _claim = slot.claim.lock();
            let pending = snapshot(player, &slot.counts.lock());
            if pending.is_empty() {
                Ok(pending)
            } else {
                f(&pending).map(|()| {
                    settle_counts(player, &mut slot.counts.lock(), &pending);
                    pending
                })
            }
        };
        drop(slot);
        self.prune(player);
        outcome
    }

    /// Total pending tokens for a player
    pub fn pending_total(&self, player: &PlayerId) -> u64 {
        self.list_pending(player)
            .iter()
            .map(|e| e.count as u64)
            .sum()
    }
}

fn snapshot(player: &PlayerId, counts: &PlayerCounts) -> Vec<PendingEntry> {
    counts
        .iter()
        .map(|(&token_type, &count)| PendingEntry {
            user: player.clone(),
            token_type,
            count,
        })
        .collect()
}

fn settle_counts(player: &PlayerId, counts: &mut PlayerCounts, claimed: &[PendingEntry]) {
    for entry in claimed {
        if let Some(count) = counts.get_mut(&entry.token_type) {
            *count = count.saturating_sub(entry.count);
            if *count == 0 {
                counts.remove(&entry.token_type);
            }
        }
    }
    log::info!(
        "Settled {} claimed entries for user {player}, {} still pending",
        claimed.len(),
        counts.len()
    );
}
