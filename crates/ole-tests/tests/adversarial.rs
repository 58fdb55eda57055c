//! Adversarial property-based tests for the reward distributor.
//!
//! Random operation sequences are replayed against a [`Harness`]; after
//! every step the accounting invariants must still hold, whether the step
//! succeeded or was rejected.
//!
//! Invariants checked:
//! - Escrow balance equals outstanding obligations (no value created or lost)
//! - `withdrawn` never decreases and never exceeds the entitlement
//! - Exited claims reconcile exactly: withdrawals + penalty == amount
//! - Rejected operations leave state untouched
//! - A claim can be made only once, and never over the epoch principal

use std::collections::BTreeMap;

use proptest::prelude::*;

use ole_core::constants::{DAY, TOKEN};
use ole_core::error::DistributorError;
use ole_core::types::{AccountId, Amount};
use ole_distributor::NewEpoch;
use ole_tests::helpers::*;

const ACCOUNTS: [AccountId; 3] = [ALICE, BOB, CAROL];

#[derive(Debug, Clone)]
enum Op {
    Advance(u64),
    Withdraw(usize),
    WithdrawMul(usize, bool),
    Exit(usize),
    Convert(usize),
    Recycle,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..=40 * DAY).prop_map(Op::Advance),
        (0usize..3).prop_map(Op::Withdraw),
        (0usize..3, any::<bool>()).prop_map(|(i, dup)| Op::WithdrawMul(i, dup)),
        (0usize..3).prop_map(Op::Exit),
        (0usize..3).prop_map(Op::Convert),
        Just(Op::Recycle),
    ]
}

/// Apply `op` to a harness with epochs 1 and 2, all accounts claimed in both.
fn apply(h: &mut Harness, op: &Op) -> Result<(), DistributorError> {
    match *op {
        Op::Advance(secs) => {
            h.advance(secs);
            Ok(())
        }
        Op::Withdraw(i) => h.distributor.withdraw(&ACCOUNTS[i], 1).map(|_| ()),
        Op::WithdrawMul(i, dup) => {
            let ids: &[u64] = if dup { &[1, 2, 1] } else { &[1, 2] };
            h.distributor.withdraw_mul(&ACCOUNTS[i], ids).map(|_| ())
        }
        Op::Exit(i) => h.distributor.early_exit(&ACCOUNTS[i], 2).map(|_| ()),
        Op::Convert(i) => {
            let unlock = h.now() + 365 * DAY;
            h.distributor
                .convert_to_new_xole(&ACCOUNTS[i], 2, 100 * TOKEN, unlock)
                .map(|_| ())
        }
        Op::Recycle => h.distributor.recycle(&ADMIN, &[1, 2]).map(|_| ()),
    }
}

fn setup() -> Harness {
    let mut h = Harness::new();
    h.create_default_epoch();
    h.create_default_epoch();
    for account in &ACCOUNTS {
        h.vest(account, 1).unwrap();
        h.vest(account, 2).unwrap();
        h.fund_paired(account, 1_000 * TOKEN);
    }
    h
}

fn withdrawn_by_claim(h: &Harness) -> BTreeMap<(u64, AccountId), Amount> {
    h.distributor
        .state()
        .claims
        .iter()
        .map(|(key, claim)| (*key, claim.withdrawn()))
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Random operation sequences preserve accounting
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn fuzz_operation_sequences(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut h = setup();
        let mut previous = withdrawn_by_claim(&h);

        for op in &ops {
            let before = h.distributor.state().clone();
            let result = apply(&mut h, op);
            if result.is_err() {
                prop_assert_eq!(h.distributor.state(), &before, "rejected {:?} mutated state", op);
            }

            assert_escrow_reconciles(&h);

            let current = withdrawn_by_claim(&h);
            for (key, withdrawn) in &current {
                let claim = h.distributor.state().claims[key].clone();
                prop_assert!(*withdrawn >= previous[key], "withdrawn decreased for {:?}", key);
                prop_assert!(*withdrawn <= claim.amount);
                if claim.is_exited() {
                    let (paid, penalty) = withdrawn_from_events(&h, key.0, &key.1);
                    prop_assert_eq!(paid + penalty, claim.amount);
                    prop_assert_eq!(paid, *withdrawn);
                }
            }
            previous = current;
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Early exit reconciles for any parameters and timing
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn fuzz_exit_reconciliation(
        base in 0u64..5_000,
        add in 0u64..5_000,
        vest_days in 1u64..=365,
        withdraw_at in 0u64..=400 * DAY,
        exit_after in 0u64..=400 * DAY,
    ) {
        prop_assume!(base + add < 10_000);
        let mut h = Harness::new();
        let params = Harness::default_epoch();
        let id = h
            .distributor
            .create_epoch(
                &ADMIN,
                NewEpoch {
                    curve: ole_core::types::CurveParams {
                        vest_duration: vest_days * DAY,
                        penalty_base: base,
                        penalty_add: add,
                    },
                    ..params
                },
            )
            .unwrap();
        h.vest(&CAROL, id).unwrap();

        h.advance(withdraw_at);
        let first = h.distributor.withdraw(&CAROL, id).unwrap_or(0);
        h.advance(exit_after);
        match h.distributor.early_exit(&CAROL, id) {
            Ok(quote) => prop_assert_eq!(first + quote.amount + quote.penalty, 30 * TOKEN),
            // Only a fully withdrawn claim may refuse to exit.
            Err(err) => {
                prop_assert_eq!(err, DistributorError::InvalidAmount);
                prop_assert_eq!(first, 30 * TOKEN);
            }
        }
        assert_escrow_reconciles(&h);
    }
}

// ---------------------------------------------------------------------------
// 3. Claims: single use and principal cap
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn fuzz_double_claim_always_rejected(amount in 0u128..=100 * TOKEN, idx in 0usize..3) {
        let mut h = Harness::new();
        let id = h.create_default_epoch();
        let account = ACCOUNTS[idx];
        h.vest(&account, id).unwrap();
        let proof = h.proof(&account);

        let vested_before = h.distributor.epoch(id).unwrap().vested;
        let result = h.distributor.vest(&account, id, amount, &proof);
        prop_assert!(result.is_err());
        // Zero or over-cap amounts fail the amount check before the duplicate check.
        if amount > 0 && vested_before + amount <= 60 * TOKEN {
            prop_assert_eq!(result, Err(DistributorError::AlreadyVested(id)));
        }
        prop_assert_eq!(h.distributor.epoch(id).unwrap().vested, vested_before);
    }

    #[test]
    fn fuzz_principal_cap(total in 1u128..=60 * TOKEN) {
        let mut h = Harness::new();
        let id = h
            .distributor
            .create_epoch(&ADMIN, NewEpoch { total, ..Harness::default_epoch() })
            .unwrap();

        let mut claimed = 0;
        for account in &ACCOUNTS {
            let entitlement = Harness::entitlement(account);
            match h.vest(account, id) {
                Ok(()) => claimed += entitlement,
                Err(err) => {
                    prop_assert_eq!(err, DistributorError::InvalidAmount);
                    prop_assert!(claimed + entitlement > total);
                }
            }
            prop_assert_eq!(h.distributor.epoch(id).unwrap().vested, claimed);
            prop_assert!(claimed <= total);
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Batch atomicity
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn fuzz_withdraw_mul_all_or_nothing(
        elapsed in 1u64..=120 * DAY,
        ids in prop::collection::vec(1u64..=3, 1..6),
    ) {
        let mut h = setup();
        h.advance(elapsed);
        let before = h.distributor.state().clone();
        let balance_before = h.reward.balance_of(&ALICE);

        let has_duplicate = ids.iter().enumerate().any(|(i, id)| ids[..i].contains(id));
        let has_unknown = ids.contains(&3);
        match h.distributor.withdraw_mul(&ALICE, &ids) {
            Ok(total) => {
                prop_assert!(!has_duplicate && !has_unknown);
                prop_assert_eq!(h.reward.balance_of(&ALICE), balance_before + total);
            }
            Err(_) => {
                prop_assert!(has_duplicate || has_unknown);
                prop_assert_eq!(h.distributor.state(), &before);
                prop_assert_eq!(h.reward.balance_of(&ALICE), balance_before);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Deterministic attack scenarios
// ---------------------------------------------------------------------------

#[test]
fn forged_proof_for_other_account_rejected() {
    let mut h = Harness::new();
    let id = h.create_default_epoch();
    let carol_proof = h.proof(&CAROL);
    assert_eq!(
        h.distributor.vest(&ALICE, id, 30 * TOKEN, &carol_proof),
        Err(DistributorError::IncorrectMerkleProof)
    );
}

#[test]
fn exit_then_convert_rejected() {
    let mut h = setup();
    h.distributor.early_exit(&ALICE, 2).unwrap();
    let unlock = h.now() + 365 * DAY;
    assert_eq!(
        h.distributor.convert_to_new_xole(&ALICE, 2, 100 * TOKEN, unlock),
        Err(DistributorError::InvalidAmount)
    );
}

#[test]
fn convert_then_exit_rejected() {
    let mut h = setup();
    let unlock = h.now() + 365 * DAY;
    h.distributor
        .convert_to_new_xole(&BOB, 2, 100 * TOKEN, unlock)
        .unwrap();
    assert_eq!(
        h.distributor.early_exit(&BOB, 2),
        Err(DistributorError::InvalidAmount)
    );
    assert_escrow_reconciles(&h);
}

#[test]
fn recycle_cannot_touch_claimed_principal() {
    let mut h = setup();
    h.advance(30 * DAY);
    assert_eq!(h.distributor.recycle(&ADMIN, &[1, 2]), Ok(0));
    h.advance(60 * DAY);
    assert_eq!(h.distributor.withdraw_mul(&CAROL, &[1, 2]), Ok(60 * TOKEN));
    assert_escrow_reconciles(&h);
}
