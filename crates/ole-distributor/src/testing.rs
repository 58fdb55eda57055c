//! Deterministic in-memory collaborators and a wired-up [`Harness`].
//!
//! Available under `#[cfg(test)]` or with the `testing` feature, so
//! downstream suites can drive a [`Distributor`] without real ledgers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use ole_core::constants::{DAY, TOKEN};
use ole_core::error::{DistributorError, LockError, OracleError};
use ole_core::merkle::{MembershipProof, MembershipTree, MerkleVerifier};
use ole_core::traits::{ExitCurve, GovernanceLock, PriceOracle, TokenLedger};
use ole_core::types::{AccountId, Amount, CurveParams, EpochId, LockedBalance, Price, Timestamp};

use crate::config::Settings;
use crate::distributor::{Collaborators, Distributor};
use crate::registry::NewEpoch;

pub const ADMIN: AccountId = AccountId([0xA0; 32]);
pub const OPERATOR: AccountId = AccountId([0x0B; 32]);
pub const ESCROW: AccountId = AccountId([0xE5; 32]);
pub const LOCK_CUSTODY: AccountId = AccountId([0x10; 32]);
pub const ALICE: AccountId = AccountId([0x01; 32]);
pub const BOB: AccountId = AccountId([0x02; 32]);
pub const CAROL: AccountId = AccountId([0x03; 32]);

/// Harness clock at construction.
pub const START: Timestamp = 1_700_000_000;

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<AccountId, Amount>,
    /// Owner → amount the escrow may pull.
    allowances: HashMap<AccountId, Amount>,
    fail: bool,
    fail_payouts: bool,
}

/// Single-token ledger on which the distributor acts as `holder`.
#[derive(Debug)]
pub struct FakeToken {
    holder: AccountId,
    book: Mutex<Book>,
}

impl FakeToken {
    pub fn new(holder: AccountId) -> Self {
        Self {
            holder,
            book: Mutex::new(Book::default()),
        }
    }

    pub fn mint(&self, to: &AccountId, amount: Amount) {
        *self.book.lock().balances.entry(*to).or_default() += amount;
    }

    /// Let the holder pull up to `amount` from `owner` (replaces any prior approval).
    pub fn approve(&self, owner: &AccountId, amount: Amount) {
        self.book.lock().allowances.insert(*owner, amount);
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.book.lock().balances.get(account).copied().unwrap_or(0)
    }

    /// Make every subsequent transfer report failure.
    pub fn fail_transfers(&self, fail: bool) {
        self.book.lock().fail = fail;
    }

    /// Make holder payouts report failure while pulls still succeed.
    pub fn fail_payouts(&self, fail: bool) {
        self.book.lock().fail_payouts = fail;
    }

    /// Move funds directly, as a privileged module would.
    pub fn move_balance(&self, from: &AccountId, to: &AccountId, amount: Amount) -> bool {
        let mut book = self.book.lock();
        if book.fail {
            return false;
        }
        Self::debit_credit(&mut book, from, to, amount)
    }

    fn debit_credit(book: &mut Book, from: &AccountId, to: &AccountId, amount: Amount) -> bool {
        let balance = book.balances.get(from).copied().unwrap_or(0);
        if balance < amount {
            return false;
        }
        book.balances.insert(*from, balance - amount);
        *book.balances.entry(*to).or_default() += amount;
        true
    }
}

impl TokenLedger for FakeToken {
    fn transfer(&self, to: &AccountId, amount: Amount) -> bool {
        if self.book.lock().fail_payouts {
            return false;
        }
        self.move_balance(&self.holder, to, amount)
    }

    fn transfer_from(&self, from: &AccountId, to: &AccountId, amount: Amount) -> bool {
        let mut book = self.book.lock();
        if book.fail {
            return false;
        }
        let allowance = book.allowances.get(from).copied().unwrap_or(0);
        if allowance < amount || !Self::debit_credit(&mut book, from, to, amount) {
            return false;
        }
        book.allowances.insert(*from, allowance - amount);
        true
    }
}

/// Oracle returning settable spot and reference prices (both 1:1 initially).
#[derive(Debug)]
pub struct FakeOracle {
    prices: Mutex<(Price, Price)>,
    unavailable: Mutex<bool>,
}

impl Default for FakeOracle {
    fn default() -> Self {
        Self {
            prices: Mutex::new((Price::new(1, 1), Price::new(1, 1))),
            unavailable: Mutex::new(false),
        }
    }
}

impl FakeOracle {
    pub fn set_price(&self, spot: Price) {
        self.prices.lock().0 = spot;
    }

    pub fn set_reference(&self, reference: Price) {
        self.prices.lock().1 = reference;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    fn check(&self) -> Result<(), OracleError> {
        if *self.unavailable.lock() {
            Err(OracleError::Unavailable("fake oracle offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl PriceOracle for FakeOracle {
    fn price(&self) -> Result<Price, OracleError> {
        self.check()?;
        Ok(self.prices.lock().0)
    }

    fn reference_price(&self) -> Result<Price, OracleError> {
        self.check()?;
        Ok(self.prices.lock().1)
    }
}

/// Lock module drawing both assets from the escrow into its custody account.
///
/// A lock's `amount` counts reward tokens only.
#[derive(Debug)]
pub struct FakeLock {
    escrow: AccountId,
    reward: Arc<FakeToken>,
    paired: Arc<FakeToken>,
    locks: Mutex<HashMap<AccountId, LockedBalance>>,
}

impl FakeLock {
    pub fn new(escrow: AccountId, reward: Arc<FakeToken>, paired: Arc<FakeToken>) -> Self {
        Self {
            escrow,
            reward,
            paired,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Install a lock directly, bypassing custody.
    pub fn seed_lock(&self, account: &AccountId, amount: Amount, end: Timestamp) {
        self.locks.lock().insert(*account, LockedBalance { amount, end });
    }

    fn draw(&self, reward_amount: Amount, paired_amount: Amount) -> Result<(), LockError> {
        if !self.reward.move_balance(&self.escrow, &LOCK_CUSTODY, reward_amount) {
            return Err(LockError::Underfunded);
        }
        if !self.paired.move_balance(&self.escrow, &LOCK_CUSTODY, paired_amount) {
            self.reward.move_balance(&LOCK_CUSTODY, &self.escrow, reward_amount);
            return Err(LockError::Underfunded);
        }
        Ok(())
    }
}

impl GovernanceLock for FakeLock {
    fn create_lock_for(
        &self,
        account: &AccountId,
        reward_amount: Amount,
        paired_amount: Amount,
        unlock_time: u64,
    ) -> Result<(), LockError> {
        if self.locked(account).amount > 0 {
            return Err(LockError::AlreadyLocked(account.to_string()));
        }
        self.draw(reward_amount, paired_amount)?;
        self.seed_lock(account, reward_amount, unlock_time);
        Ok(())
    }

    fn increase_amount(
        &self,
        account: &AccountId,
        reward_amount: Amount,
        paired_amount: Amount,
    ) -> Result<(), LockError> {
        let current = self.locked(account);
        if current.amount == 0 {
            return Err(LockError::NoLock(account.to_string()));
        }
        self.draw(reward_amount, paired_amount)?;
        self.seed_lock(account, current.amount + reward_amount, current.end);
        Ok(())
    }

    fn locked(&self, account: &AccountId) -> LockedBalance {
        self.locks.lock().get(account).copied().unwrap_or_default()
    }
}

/// Allocation committed by [`Harness::default_epoch`]: 10, 20, and 30 tokens.
pub fn allocation() -> Vec<(AccountId, Amount)> {
    vec![(ALICE, 10 * TOKEN), (BOB, 20 * TOKEN), (CAROL, 30 * TOKEN)]
}

/// A distributor wired to fakes, with a manually advanced clock.
///
/// The admin starts with a large reward balance approved for the escrow.
pub struct Harness {
    pub distributor: Distributor,
    pub reward: Arc<FakeToken>,
    pub paired: Arc<FakeToken>,
    pub oracle: Arc<FakeOracle>,
    pub lock: Arc<FakeLock>,
    pub escrow: AccountId,
    pub tree: MembershipTree,
    clock: Arc<AtomicU64>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        let reward = Arc::new(FakeToken::new(ESCROW));
        let paired = Arc::new(FakeToken::new(ESCROW));
        let oracle = Arc::new(FakeOracle::default());
        let lock = Arc::new(FakeLock::new(ESCROW, reward.clone(), paired.clone()));
        reward.mint(&ADMIN, 1_000_000 * TOKEN);
        reward.approve(&ADMIN, Amount::MAX);

        let clock = Arc::new(AtomicU64::new(START));
        let ticks = clock.clone();
        let collaborators = Collaborators {
            reward_token: reward.clone(),
            paired_token: paired.clone(),
            membership: Arc::new(MerkleVerifier),
            oracle: oracle.clone(),
            lock: lock.clone(),
        };
        let distributor = Distributor::with_clock(
            Settings::new(ADMIN, ESCROW).with_operator(OPERATOR),
            collaborators,
            move || ticks.load(Ordering::SeqCst),
        );

        Self {
            distributor,
            reward,
            paired,
            oracle,
            lock,
            escrow: ESCROW,
            tree: MembershipTree::from_entries(&allocation()),
            clock,
        }
    }

    /// A fresh set of collaborators sharing this harness's fakes.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            reward_token: self.reward.clone(),
            paired_token: self.paired.clone(),
            membership: Arc::new(MerkleVerifier),
            oracle: self.oracle.clone(),
            lock: self.lock.clone(),
        }
    }

    /// Swap the distributor's exit curve.
    pub fn with_curve(self, curve: Arc<dyn ExitCurve>) -> Self {
        Self {
            distributor: self.distributor.with_curve(curve),
            ..self
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.load(Ordering::SeqCst)
    }

    pub fn advance(&self, secs: u64) {
        self.clock.fetch_add(secs, Ordering::SeqCst);
    }

    /// 60 tokens over [`allocation`], open for 30 days from [`START`],
    /// vesting over 90 days with base 2000 / add 6000.
    pub fn default_epoch() -> NewEpoch {
        NewEpoch {
            merkle_root: MembershipTree::from_entries(&allocation()).root(),
            total: 60 * TOKEN,
            start_time: START,
            expire_time: START + 30 * DAY,
            curve: CurveParams {
                vest_duration: 90 * DAY,
                penalty_base: 2_000,
                penalty_add: 6_000,
            },
        }
    }

    pub fn create_default_epoch(&mut self) -> EpochId {
        self.distributor
            .create_epoch(&ADMIN, Self::default_epoch())
            .expect("default epoch is valid and funded")
    }

    /// Entitlement of `account` in [`allocation`] (zero if absent).
    pub fn entitlement(account: &AccountId) -> Amount {
        allocation()
            .into_iter()
            .find(|(a, _)| a == account)
            .map_or(0, |(_, amount)| amount)
    }

    pub fn proof(&self, account: &AccountId) -> MembershipProof {
        self.tree
            .proof_for(account, Self::entitlement(account))
            .unwrap_or_default()
    }

    /// Claim `account`'s full allocation in `epoch_id`.
    pub fn vest(&mut self, account: &AccountId, epoch_id: EpochId) -> Result<(), DistributorError> {
        let proof = self.proof(account);
        self.distributor
            .vest(account, epoch_id, Self::entitlement(account), &proof)
    }

    /// Give `account` paired asset and approve it all for the escrow.
    pub fn fund_paired(&self, account: &AccountId, amount: Amount) {
        self.paired.mint(account, amount);
        self.paired.approve(account, amount);
    }
}
