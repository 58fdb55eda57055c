//! Shared helpers for E2E and adversarial tests.

use ole_core::types::{AccountId, Amount, EpochId, ExitQuote};
use ole_distributor::DistributorEvent;

pub use ole_distributor::testing::{allocation, Harness, ADMIN, ALICE, BOB, CAROL, OPERATOR, START};

/// Harness with one default epoch created and `accounts` claimed into it.
pub fn vested(accounts: &[AccountId]) -> (Harness, EpochId) {
    let mut h = Harness::new();
    let id = h.create_default_epoch();
    for account in accounts {
        h.vest(account, id).unwrap();
    }
    (h, id)
}

/// Early-exit Alice's 10-token claim `secs` after she claimed.
pub fn exit_after(secs: u64) -> ExitQuote {
    let (mut h, id) = vested(&[ALICE]);
    h.advance(secs);
    h.distributor.early_exit(&ALICE, id).unwrap()
}

/// Reward tokens held by the escrow must equal what it still owes:
/// unwithdrawn claims, unclaimed principal of live epochs, and penalties.
pub fn assert_escrow_reconciles(h: &Harness) {
    let liability = h
        .distributor
        .state()
        .escrow_liability()
        .expect("liability fits in u128");
    assert_eq!(
        h.reward.balance_of(&h.escrow),
        liability,
        "escrow balance diverged from outstanding obligations"
    );
}

/// Sum of `Withdrawn` amounts and penalties recorded for `(epoch, account)`.
pub fn withdrawn_from_events(h: &Harness, epoch: EpochId, who: &AccountId) -> (Amount, Amount) {
    h.distributor
        .events()
        .iter()
        .filter_map(|e| match e {
            DistributorEvent::Withdrawn {
                epoch_id,
                account,
                amount,
                penalty,
            } if *epoch_id == epoch && account == who => Some((*amount, *penalty)),
            _ => None,
        })
        .fold((0, 0), |(a, p), (amount, penalty)| (a + amount, p + penalty))
}
