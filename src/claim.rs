//! Claim flow: pending ledger -> claim sink
//!
//! The sink is the authoritative balance store. The ledger only gives up
//! entries after the sink has accepted the batch.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;

use crate::catalog::{PlayerId, TokenTypeId};
use crate::error::ClaimError;
use crate::ledger::{PendingEntry, PendingLedger};

/// External system converting a batch of token types into balances
pub trait ClaimSink: Send + Sync {
    /// Credit one unit per listed token type. Must be all-or-nothing.
    fn claim(&self, player: &PlayerId, types: &[TokenTypeId]) -> Result<(), ClaimError>;
}

/// Result of a successful claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimReceipt {
    pub claimed: u64,
    pub tokens: Vec<PendingEntry>,
}

/// Expand pending entries into one type id per collected token
pub fn expand_types(entries: &[PendingEntry]) -> Vec<TokenTypeId> {
    entries
        .iter()
        .flat_map(|e| std::iter::repeat_n(e.token_type, e.count as usize))
        .collect()
}

/// Claim everything pending for a player.
///
/// Nothing pending is a successful empty claim. Claims for one player run one
/// at a time, so each pending token reaches the sink once. If the sink fails
/// the ledger is left untouched so the claim can be retried.
pub fn claim_all(
    ledger: &PendingLedger,
    sink: &dyn ClaimSink,
    player: &PlayerId,
) -> Result<ClaimReceipt, ClaimError> {
    let tokens = ledger
        .hand_off(player, |pending| sink.claim(player, &expand_types(pending)))
        .inspect_err(|e| log::warn!("Claim failed for {player}: {e}"))?;

    let claimed = tokens.iter().map(|e| e.count as u64).sum();
    if claimed == 0 {
        log::info!("No tokens to claim for {player}");
    } else {
        log::info!("Claimed {claimed} tokens for {player}");
    }
    Ok(ClaimReceipt { claimed, tokens })
}

/// Balance entry as reported to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub token_type: TokenTypeId,
    pub balance: u64,
}

/// In-process claim sink keeping per-player, per-type balances
#[derive(Debug, Default)]
pub struct BalanceBook {
    balances: Mutex<HashMap<(PlayerId, TokenTypeId), u64>>,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, player: &PlayerId, token_type: TokenTypeId) -> u64 {
        self.balances
            .lock()
            .get(&(player.clone(), token_type))
            .copied()
            .unwrap_or(0)
    }

    /// All non-zero balances for a player, sorted by token type
    pub fn balances(&self, player: &PlayerId) -> Vec<Balance> {
        let mut out: Vec<Balance> = self
            .balances
            .lock()
            .iter()
            .filter(|((p, _), _)| p == player)
            .map(|((_, token_type), &balance)| Balance {
                token_type: *token_type,
                balance,
            })
            .collect();
        out.sort_by_key(|b| b.token_type);
        out
    }
}

impl ClaimSink for BalanceBook {
    fn claim(&self, player: &PlayerId, types: &[TokenTypeId]) -> Result<(), ClaimError> {
        let mut balances = self.balances.lock();
        for &token_type in types {
            *balances.entry((player.clone(), token_type)).or_insert(0) += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, mpsc};
    use std::time::Duration;

    fn p(name: &str) -> PlayerId {
        PlayerId::parse(name).unwrap()
    }

    fn tt(id: i64) -> TokenTypeId {
        TokenTypeId::new(id).unwrap()
    }

    struct FailingSink;

    impl ClaimSink for FailingSink {
        fn claim(&self, _: &PlayerId, _: &[TokenTypeId]) -> Result<(), ClaimError> {
            Err(ClaimError::Sink("node unreachable".into()))
        }
    }

    #[test]
    fn test_claim_moves_pending_to_balances() {
        let ledger = PendingLedger::new();
        let book = BalanceBook::new();
        let alice = p("alice");
        ledger.record_collection(&alice, tt(1));
        ledger.record_collection(&alice, tt(1));
        ledger.record_collection(&alice, tt(14));

        let receipt = claim_all(&ledger, &book, &alice).unwrap();
        assert_eq!(receipt.claimed, 3);
        assert_eq!(book.balance(&alice, tt(1)), 2);
        assert_eq!(book.balance(&alice, tt(14)), 1);
        assert!(ledger.list_pending(&alice).is_empty());

        let balances: Vec<(u8, u64)> = book
            .balances(&alice)
            .iter()
            .map(|b| (b.token_type.get(), b.balance))
            .collect();
        assert_eq!(balances, vec![(1, 2), (14, 1)]);
    }

    #[test]
    fn test_failed_sink_leaves_ledger_intact() {
        let ledger = PendingLedger::new();
        let alice = p("alice");
        ledger.record_collection(&alice, tt(4));
        let before = ledger.list_pending(&alice);

        let err = claim_all(&ledger, &FailingSink, &alice).unwrap_err();
        assert!(matches!(err, ClaimError::Sink(_)));
        assert_eq!(ledger.list_pending(&alice), before);
    }

    #[test]
    fn test_empty_claim_succeeds() {
        let ledger = PendingLedger::new();
        let receipt = claim_all(&ledger, &FailingSink, &p("nobody")).unwrap();
        assert_eq!(receipt.claimed, 0);
    }

    /// Credits the balance book, but only once the test releases it
    struct GatedSink {
        book: BalanceBook,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl ClaimSink for GatedSink {
        fn claim(&self, player: &PlayerId, types: &[TokenTypeId]) -> Result<(), ClaimError> {
            let _ = self.entered.lock().send(());
            self.release
                .lock()
                .recv_timeout(Duration::from_secs(2))
                .map_err(|_| ClaimError::Sink("not released".into()))?;
            self.book.claim(player, types)
        }
    }

    #[test]
    fn test_concurrent_claims_credit_once() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let ledger = Arc::new(PendingLedger::new());
        let sink = Arc::new(GatedSink {
            book: BalanceBook::new(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let alice = p("alice");
        ledger.record_collection(&alice, tt(14));

        let spawn_claim = || {
            let (ledger, sink, alice) = (Arc::clone(&ledger), Arc::clone(&sink), alice.clone());
            std::thread::spawn(move || claim_all(&ledger, sink.as_ref(), &alice))
        };
        let first = spawn_claim();
        entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        // The second claim queues behind the first one's hand-off
        let second = spawn_claim();
        std::thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();

        let first = first.join().unwrap().unwrap();
        let second = second.join().unwrap().unwrap();
        assert_eq!(first.claimed + second.claimed, 1);
        assert_eq!(sink.book.balance(&alice, tt(14)), 1);
        assert!(ledger.list_pending(&alice).is_empty());
        assert!(entered_rx.try_recv().is_err());
    }

    #[test]
    fn test_expand_types() {
        let alice = p("alice");
        let entries = vec![
            PendingEntry {
                user: alice.clone(),
                token_type: tt(2),
                count: 2,
            },
            PendingEntry {
                user: alice,
                token_type: tt(9),
                count: 1,
            },
        ];
        assert_eq!(expand_types(&entries), vec![tt(2), tt(2), tt(9)]);
    }
}
