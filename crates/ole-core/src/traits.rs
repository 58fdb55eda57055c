//! Trait interfaces between the distributor and its collaborators.
//!
//! - [`ExitCurve`]: vesting and penalty math (ole-curve implements)
//! - [`TokenLedger`]: value transfer for the reward and paired tokens
//! - [`MembershipVerifier`]: allocation proof checks ([`MerkleVerifier`](crate::merkle::MerkleVerifier) implements)
//! - [`PriceOracle`]: reward token price in the paired asset
//! - [`GovernanceLock`]: time-locked governance stake

use crate::error::{CurveError, LockError, OracleError};
use crate::merkle::MembershipProof;
use crate::types::{AccountId, Amount, CurveParams, Hash256, LockedBalance, Price};

/// Pure computation of linear release and early-exit penalties.
///
/// All math is integer fixed-point. Implementations must keep
/// [`redeemable`](Self::redeemable) non-decreasing in `elapsed` and equal to
/// `amount` once `elapsed >= vest_duration`.
pub trait ExitCurve: Send + Sync {
    /// Amount unlocked by linear release after `elapsed` seconds.
    fn vested_amount(
        &self,
        amount: Amount,
        elapsed: u64,
        vest_duration: u64,
    ) -> Result<Amount, CurveError>;

    /// Fraction of the entitlement forfeited on exit, in parts of
    /// [`CURVE_PRECISION`](crate::constants::CURVE_PRECISION).
    fn penalty_fraction(&self, elapsed: u64, params: &CurveParams) -> Result<u64, CurveError>;

    /// Amount an early exit would leave the account with in total.
    fn redeemable(
        &self,
        amount: Amount,
        elapsed: u64,
        params: &CurveParams,
    ) -> Result<Amount, CurveError>;

    /// Amount an early exit would forfeit.
    ///
    /// Default implementation: `amount - redeemable(...)`.
    fn exit_penalty(
        &self,
        amount: Amount,
        elapsed: u64,
        params: &CurveParams,
    ) -> Result<Amount, CurveError> {
        let redeemable = self.redeemable(amount, elapsed, params)?;
        amount
            .checked_sub(redeemable)
            .ok_or(CurveError::ArithmeticOverflow)
    }
}

/// Value transfer for one token, acting on behalf of the distributor's escrow.
///
/// Every method reports success synchronously; `false` means nothing moved.
pub trait TokenLedger: Send + Sync {
    /// Move `amount` from the escrow to `to`.
    fn transfer(&self, to: &AccountId, amount: Amount) -> bool;

    /// Move `amount` from `from` to `to` under a prior approval.
    fn transfer_from(&self, from: &AccountId, to: &AccountId, amount: Amount) -> bool;
}

/// Verification of `(account, amount)` allocation entries against a root.
pub trait MembershipVerifier: Send + Sync {
    /// Leaf digest committed for `(account, amount)`.
    fn leaf(&self, account: &AccountId, amount: Amount) -> Hash256;

    /// Whether `proof` links `leaf` to `root`.
    fn verify(&self, root: &Hash256, leaf: &Hash256, proof: &MembershipProof) -> bool;
}

/// Price source used to bound conversion exchange rates.
pub trait PriceOracle: Send + Sync {
    /// Current price of one reward-token unit in paired-asset units.
    fn price(&self) -> Result<Price, OracleError>;

    /// Manipulation-resistant reference price (e.g. a time average).
    ///
    /// Default implementation returns [`price`](Self::price), which disables
    /// the deviation guard.
    fn reference_price(&self) -> Result<Price, OracleError> {
        self.price()
    }
}

/// External governance-lock module.
///
/// Implementations draw `reward_amount` of the reward token and
/// `paired_amount` of the paired asset from the distributor's escrow.
/// An error means nothing was drawn and no lock changed.
pub trait GovernanceLock: Send + Sync {
    /// Create a lock for `account` ending at `unlock_time`.
    fn create_lock_for(
        &self,
        account: &AccountId,
        reward_amount: Amount,
        paired_amount: Amount,
        unlock_time: u64,
    ) -> Result<(), LockError>;

    /// Add to the existing lock of `account`, keeping its end time.
    fn increase_amount(
        &self,
        account: &AccountId,
        reward_amount: Amount,
        paired_amount: Amount,
    ) -> Result<(), LockError>;

    /// Current lock of `account`; default (zero) when none exists.
    fn locked(&self, account: &AccountId) -> LockedBalance;
}
