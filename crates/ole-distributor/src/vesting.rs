//! Linear release and withdrawal.

use tracing::{info, warn};

use ole_core::error::DistributorError;
use ole_core::types::{AccountId, Amount, Claim, Epoch, EpochId, Timestamp};

use crate::distributor::Distributor;
use crate::events::DistributorEvent;

impl Distributor {
    /// Released-but-not-withdrawn amount of `claim` at `now`; zero once exited.
    pub(crate) fn released(
        &self,
        epoch: &Epoch,
        claim: &Claim,
        now: Timestamp,
    ) -> Result<Amount, DistributorError> {
        if claim.is_exited() {
            return Ok(0);
        }
        let vested =
            self.curve
                .vested_amount(claim.amount, claim.elapsed(now), epoch.curve.vest_duration)?;
        Ok(vested.min(claim.amount).saturating_sub(claim.withdrawn()))
    }

    /// Withdrawable amount of `account` in each of `epoch_ids`, in order.
    ///
    /// Unknown epochs, missing claims, and exited claims report zero.
    pub fn get_withdrawable(
        &self,
        account: &AccountId,
        epoch_ids: &[EpochId],
    ) -> Result<Vec<Amount>, DistributorError> {
        let now = self.now();
        epoch_ids
            .iter()
            .map(|id| {
                match (self.state.epochs.get(id), self.state.claims.get(&(*id, *account))) {
                    (Some(epoch), Some(claim)) => self.released(epoch, claim, now),
                    _ => Ok(0),
                }
            })
            .collect()
    }

    /// Withdraw everything released so far in `epoch_id`.
    ///
    /// # Errors
    ///
    /// `NoReward` without a claim; `InvalidAmount` when the claim has exited
    /// or nothing new has been released; `TransferFailed` if the payout fails.
    pub fn withdraw(
        &mut self,
        caller: &AccountId,
        epoch_id: EpochId,
    ) -> Result<Amount, DistributorError> {
        self.withdraw_mul(caller, &[epoch_id])
    }

    /// Withdraw from several epochs in one all-or-nothing step.
    ///
    /// Ids are processed in order against the running state, so a repeated
    /// id sees its first occurrence's withdrawal and yields zero. Any zero
    /// delta fails the whole batch with `InvalidAmount`. The summed amount is
    /// paid in one transfer; one `Withdrawn` event is recorded per id.
    pub fn withdraw_mul(
        &mut self,
        caller: &AccountId,
        epoch_ids: &[EpochId],
    ) -> Result<Amount, DistributorError> {
        if epoch_ids.is_empty() {
            return Err(DistributorError::InvalidAmount);
        }
        let now = self.now();

        self.transact(|d| {
            let mut total: Amount = 0;
            for &id in epoch_ids {
                let delta = d.release(caller, id, now)?;
                total = total
                    .checked_add(delta)
                    .ok_or(DistributorError::ArithmeticOverflow)?;
            }
            if !d.reward_token.transfer(caller, total) {
                warn!(account = %caller, amount = total, "withdraw transfer failed");
                return Err(DistributorError::TransferFailed);
            }
            info!(account = %caller, epochs = epoch_ids.len(), amount = total, "withdrawn");
            Ok(total)
        })
    }

    /// Advance one claim by its released delta and record the event.
    fn release(
        &mut self,
        account: &AccountId,
        epoch_id: EpochId,
        now: Timestamp,
    ) -> Result<Amount, DistributorError> {
        let epoch = self
            .state
            .epochs
            .get(&epoch_id)
            .ok_or(DistributorError::NoReward(epoch_id))?;
        let claim = self
            .state
            .claims
            .get(&(epoch_id, *account))
            .filter(|c| c.amount > 0)
            .ok_or(DistributorError::NoReward(epoch_id))?;
        if claim.is_exited() {
            return Err(DistributorError::InvalidAmount);
        }
        let delta = self.released(epoch, claim, now)?;
        if delta == 0 {
            return Err(DistributorError::InvalidAmount);
        }
        let to = claim
            .withdrawn()
            .checked_add(delta)
            .ok_or(DistributorError::ArithmeticOverflow)?;

        self.state
            .claims
            .get_mut(&(epoch_id, *account))
            .ok_or(DistributorError::NoReward(epoch_id))?
            .advance(to)?;
        self.emit(DistributorEvent::Withdrawn {
            epoch_id,
            account: *account,
            amount: delta,
            penalty: 0,
        });
        Ok(delta)
    }
}
