//! Conversion of unwithdrawn entitlement into a governance lock.
//!
//! The whole unwithdrawn balance of a claim is paired with the paired asset
//! at the oracle's spot price (rounded up) and forwarded to the lock module,
//! either as a new lock or as an increase of an existing one. The claim is
//! left fully withdrawn.

use tracing::{error, info, warn};

use ole_core::constants::MAX_LOCK_DURATION;
use ole_core::error::{DistributorError, OracleError};
use ole_core::types::{AccountId, Amount, EpochId, Timestamp};

use crate::distributor::Distributor;
use crate::events::DistributorEvent;

/// Amounts moved into the lock by one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Conversion {
    /// Reward tokens redirected from the claim.
    pub amount: Amount,
    /// Paired asset pulled from the caller.
    pub paired_amount: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockTarget {
    Create { unlock_time: Timestamp },
    Increase,
}

impl Distributor {
    /// Convert `caller`'s claim into a new lock owned by `caller`.
    ///
    /// `max_paired_amount` caps the paired asset the caller is willing to pay.
    pub fn convert_to_new_xole(
        &mut self,
        caller: &AccountId,
        epoch_id: EpochId,
        max_paired_amount: Amount,
        unlock_time: Timestamp,
    ) -> Result<Conversion, DistributorError> {
        self.convert(caller, epoch_id, caller, max_paired_amount, LockTarget::Create { unlock_time })
    }

    /// Convert `caller`'s claim into a new lock owned by `beneficiary`.
    pub fn convert_to_new_xole_for_others(
        &mut self,
        caller: &AccountId,
        epoch_id: EpochId,
        beneficiary: &AccountId,
        max_paired_amount: Amount,
        unlock_time: Timestamp,
    ) -> Result<Conversion, DistributorError> {
        self.convert(caller, epoch_id, beneficiary, max_paired_amount, LockTarget::Create { unlock_time })
    }

    /// Convert `caller`'s claim into an increase of `caller`'s existing lock.
    pub fn convert_and_increase_xole_amount(
        &mut self,
        caller: &AccountId,
        epoch_id: EpochId,
        max_paired_amount: Amount,
    ) -> Result<Conversion, DistributorError> {
        self.convert(caller, epoch_id, caller, max_paired_amount, LockTarget::Increase)
    }

    /// Convert `caller`'s claim into an increase of `beneficiary`'s existing lock.
    pub fn convert_and_increase_xole_amount_for_others(
        &mut self,
        caller: &AccountId,
        epoch_id: EpochId,
        beneficiary: &AccountId,
        max_paired_amount: Amount,
    ) -> Result<Conversion, DistributorError> {
        self.convert(caller, epoch_id, beneficiary, max_paired_amount, LockTarget::Increase)
    }

    /// # Errors
    ///
    /// - `NoReward` without a claim
    /// - `InvalidAmount` if the claim has exited or nothing is unwithdrawn
    /// - `InvalidTime` if the unlock time (or existing lock end) is outside
    ///   `[now + min_lock_duration, now + MAX_LOCK_DURATION]`
    /// - `ExceedMax` if spot deviates from the reference price beyond the
    ///   configured tolerance, or the required paired amount exceeds
    ///   `max_paired_amount`
    /// - `TransferFailed` if the paired asset cannot be pulled, or cannot be
    ///   refunded after the lock call fails
    /// - `Lock` / `Oracle` for collaborator rejections
    fn convert(
        &mut self,
        caller: &AccountId,
        epoch_id: EpochId,
        beneficiary: &AccountId,
        max_paired_amount: Amount,
        target: LockTarget,
    ) -> Result<Conversion, DistributorError> {
        let now = self.now();

        self.transact(|d| {
            let claim = d
                .state
                .claims
                .get(&(epoch_id, *caller))
                .ok_or(DistributorError::NoReward(epoch_id))?;
            let amount = claim.unwithdrawn();
            if amount == 0 {
                return Err(DistributorError::InvalidAmount);
            }
            let entitlement = claim.amount;

            d.check_lock_window(beneficiary, target, now)?;
            let paired_amount = d.quote_paired(amount, max_paired_amount)?;

            d.state
                .claims
                .get_mut(&(epoch_id, *caller))
                .ok_or(DistributorError::NoReward(epoch_id))?
                .advance(entitlement)?;
            let unlock_time = match target {
                LockTarget::Create { unlock_time } => Some(unlock_time),
                LockTarget::Increase => None,
            };
            d.emit(DistributorEvent::Converted {
                epoch_id,
                account: *caller,
                beneficiary: *beneficiary,
                amount,
                paired_amount,
                unlock_time,
            });

            let escrow = d.state.escrow;
            if paired_amount > 0 && !d.paired_token.transfer_from(caller, &escrow, paired_amount) {
                warn!(epoch_id, account = %caller, paired_amount, "paired asset pull failed");
                return Err(DistributorError::TransferFailed);
            }

            let locked = match target {
                LockTarget::Create { unlock_time } => {
                    d.lock.create_lock_for(beneficiary, amount, paired_amount, unlock_time)
                }
                LockTarget::Increase => d.lock.increase_amount(beneficiary, amount, paired_amount),
            };
            if let Err(err) = locked {
                warn!(epoch_id, beneficiary = %beneficiary, %err, "lock call failed");
                if paired_amount > 0 && !d.paired_token.transfer(caller, paired_amount) {
                    error!(epoch_id, account = %caller, paired_amount, "paired asset refund failed");
                    return Err(DistributorError::TransferFailed);
                }
                return Err(err.into());
            }

            info!(
                epoch_id,
                account = %caller,
                beneficiary = %beneficiary,
                amount,
                paired_amount,
                "converted to lock"
            );
            Ok(Conversion { amount, paired_amount })
        })
    }

    /// Check the lock the conversion will land in lasts at least
    /// `min_lock_duration` and at most [`MAX_LOCK_DURATION`] from `now`.
    fn check_lock_window(
        &self,
        beneficiary: &AccountId,
        target: LockTarget,
        now: Timestamp,
    ) -> Result<(), DistributorError> {
        let earliest = now.saturating_add(self.state.min_lock_duration);
        let latest = now.saturating_add(MAX_LOCK_DURATION);
        let end = match target {
            LockTarget::Create { unlock_time } => unlock_time,
            LockTarget::Increase => self.lock.locked(beneficiary).end,
        };
        if end < earliest || end > latest {
            return Err(DistributorError::InvalidTime);
        }
        Ok(())
    }

    /// Paired asset required for `amount` reward units at the guarded spot price.
    fn quote_paired(&self, amount: Amount, max_paired_amount: Amount) -> Result<Amount, DistributorError> {
        let spot = self.oracle.price()?;
        let reference = self.oracle.reference_price()?;
        if spot.is_zero() || reference.is_zero() {
            return Err(OracleError::ZeroPrice.into());
        }
        let deviation = spot
            .deviation_bps(&reference)
            .ok_or(DistributorError::ArithmeticOverflow)?;
        let allowed = u128::from(self.state.max_price_deviation_bps);
        if deviation > allowed {
            return Err(DistributorError::ExceedMax { required: deviation, allowed });
        }

        let required = spot
            .quote_ceil(amount)
            .ok_or(DistributorError::ArithmeticOverflow)?;
        if required > max_paired_amount {
            return Err(DistributorError::ExceedMax {
                required,
                allowed: max_paired_amount,
            });
        }
        Ok(required)
    }
}
