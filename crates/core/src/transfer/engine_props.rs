//! Property-based tests for TransferEngine.
//!
//! Each case builds a fresh in-memory store, so cases are independent.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use crate::store::memory::{FailPoint, MemoryStorage};
use crate::store::{AccountStore, Scope, ScopeFactory};
use crate::transfer::engine::TransferEngine;
use crate::transfer::error::TransferError;
use crate::transfer::types::TransferRequest;

const UIDS: [&str; 3] = ["A", "B", "C"];

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime")
        .block_on(future)
}

async fn seeded(balances: [i64; 3]) -> (Arc<MemoryStorage>, TransferEngine<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    for (uid, balance) in UIDS.iter().zip(balances) {
        storage.seed_account(uid, balance).await;
    }
    let engine = TransferEngine::new(Arc::clone(&storage), Duration::from_secs(5));
    (storage, engine)
}

async fn balances(storage: &MemoryStorage) -> Vec<Option<i64>> {
    let mut out = Vec::with_capacity(UIDS.len());
    for uid in UIDS {
        out.push(storage.balance(uid).await);
    }
    out
}

/// Strategy for a transfer between two of the seeded accounts.
fn arb_transfer() -> impl Strategy<Value = TransferRequest> {
    (0..UIDS.len(), 0..UIDS.len(), 0i64..50_000)
        .prop_map(|(p, r, amount)| TransferRequest::new(UIDS[p], UIDS[r], amount))
}

/// Strategy for a fault that aborts a transfer from A to B.
fn arb_fault() -> impl Strategy<Value = FailPoint> {
    prop_oneof![
        Just(FailPoint::InsertEntry(0)),
        Just(FailPoint::InsertEntry(1)),
        Just(FailPoint::IncrementBalance("A".into())),
        Just(FailPoint::IncrementBalance("B".into())),
        Just(FailPoint::Commit),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // =========================================================================
    // Conservation and the mirror law over arbitrary transfer sequences
    // =========================================================================

    /// The sum of balances never changes and every forward entry is
    /// immediately followed by its mirror.
    #[test]
    fn prop_transfers_conserve_money(
        start in prop::array::uniform3(0i64..1_000_000),
        transfers in prop::collection::vec(arb_transfer(), 1..12),
    ) {
        let (total_before, total_after, entries, committed) = block_on(async {
            let (storage, engine) = seeded(start).await;
            let mut committed = 0usize;
            for request in &transfers {
                if engine.execute(request).await.is_ok() {
                    committed += 1;
                }
            }
            let after: i64 = balances(&storage).await.into_iter().flatten().sum();
            (start.iter().sum::<i64>(), after, storage.entries().await, committed)
        });

        prop_assert_eq!(total_before, total_after);
        prop_assert_eq!(committed, transfers.len());
        prop_assert_eq!(entries.len(), 2 * committed);
        prop_assert_eq!(entries.iter().map(|e| e.amount).sum::<i64>(), 0);
        for pair in entries.chunks(2) {
            prop_assert!(pair[1].is_mirror_of(&pair[0]));
            prop_assert!(pair[0].amount >= 0);
        }
    }

    // =========================================================================
    // Atomicity
    // =========================================================================

    /// A fault at any step leaves balances and the ledger untouched.
    #[test]
    fn prop_failed_transfer_changes_nothing(
        start in prop::array::uniform3(0i64..1_000_000),
        amount in 1i64..50_000,
        fault in arb_fault(),
    ) {
        let (result, before, after, entries) = block_on(async {
            let (storage, engine) = seeded(start).await;
            storage.fail_on(fault).await;
            let before = balances(&storage).await;
            let result = engine.execute(&TransferRequest::new("A", "B", amount)).await;
            (result, before, balances(&storage).await, storage.entries().await)
        });

        let is_storage_error = matches!(result, Err(TransferError::Storage { .. }));
        prop_assert!(is_storage_error);
        prop_assert_eq!(before, after);
        prop_assert!(entries.is_empty());
    }

    // =========================================================================
    // Validation accumulation
    // =========================================================================

    /// Every invalid field is reported and storage is never reached.
    #[test]
    fn prop_every_violation_reported(
        empty_payer in any::<bool>(),
        empty_recipient in any::<bool>(),
        negative in any::<bool>(),
    ) {
        prop_assume!(empty_payer || empty_recipient || negative);

        let request = TransferRequest::new(
            if empty_payer { "" } else { "A" },
            if empty_recipient { "" } else { "B" },
            if negative { -100 } else { 100 },
        );
        let (result, calls) = block_on(async {
            let (storage, engine) = seeded([0, 0, 0]).await;
            let result = engine.execute(&request).await;
            (result, storage.calls().await)
        });

        let mut expected = Vec::new();
        if negative { expected.push("amount"); }
        if empty_payer { expected.push("payer_uid"); }
        if empty_recipient { expected.push("recipient_uid"); }

        match result {
            Err(TransferError::Validation(err)) => {
                prop_assert_eq!(err.fields().collect::<Vec<_>>(), expected);
            }
            other => prop_assert!(false, "expected validation error, got {:?}", other),
        }
        prop_assert!(calls.is_empty());
    }

    // =========================================================================
    // Idempotent close
    // =========================================================================

    /// After the first close, any sequence of further closes succeeds and
    /// changes nothing.
    #[test]
    fn prop_scope_close_is_idempotent(
        commit_first in any::<bool>(),
        closes in prop::collection::vec(any::<bool>(), 0..6),
    ) {
        let (outcomes, balance) = block_on(async {
            let (storage, _) = seeded([100, 0, 0]).await;
            let scope = storage.begin().await.expect("begin");
            storage
                .increment_balance(Some(&scope), "A", 10)
                .await
                .expect("increment");

            if commit_first {
                scope.commit().await.expect("commit");
            } else {
                scope.rollback().await.expect("rollback");
            }

            let mut outcomes = Vec::new();
            for commit in closes {
                let outcome = if commit { scope.commit().await } else { scope.rollback().await };
                outcomes.push(outcome);
            }
            (outcomes, storage.balance("A").await)
        });

        prop_assert!(outcomes.iter().all(Result::is_ok));
        prop_assert_eq!(balance, Some(if commit_first { 110 } else { 100 }));
    }
}
