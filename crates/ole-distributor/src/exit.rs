//! Early exit: take the curve's redeemable amount now, forfeit the rest.

use tracing::{info, warn};

use ole_core::error::DistributorError;
use ole_core::types::{AccountId, Amount, Claim, Epoch, EpochId, ExitQuote, Timestamp};

use crate::distributor::Distributor;
use crate::events::DistributorEvent;

impl Distributor {
    /// Curve-redeemable total of `claim` at `now`, and the resulting exit quote.
    fn exit_terms(
        &self,
        epoch: &Epoch,
        claim: &Claim,
        now: Timestamp,
    ) -> Result<(Amount, ExitQuote), DistributorError> {
        let redeemable = self
            .curve
            .redeemable(claim.amount, claim.elapsed(now), &epoch.curve)?;
        let withdrawn = claim.withdrawn();
        let amount = redeemable
            .checked_sub(withdrawn)
            .ok_or(DistributorError::InvalidState { redeemable, withdrawn })?;
        let penalty = claim
            .amount
            .checked_sub(redeemable)
            .ok_or(DistributorError::ArithmeticOverflow)?;
        Ok((redeemable, ExitQuote { amount, penalty }))
    }

    /// What an early exit of `account` from `epoch_id` would pay and forfeit now.
    ///
    /// Zero when there is no active claim with an unwithdrawn balance.
    pub fn get_early_exit_withdrawable(
        &self,
        account: &AccountId,
        epoch_id: EpochId,
    ) -> Result<ExitQuote, DistributorError> {
        let (Some(epoch), Some(claim)) = (
            self.state.epochs.get(&epoch_id),
            self.state.claims.get(&(epoch_id, *account)),
        ) else {
            return Ok(ExitQuote::default());
        };
        if claim.unwithdrawn() == 0 {
            return Ok(ExitQuote::default());
        }
        let (_, quote) = self.exit_terms(epoch, claim, self.now())?;
        Ok(quote)
    }

    /// Finalize `caller`'s claim in `epoch_id` under the penalty curve.
    ///
    /// Pays `redeemable - withdrawn`, adds `amount - redeemable` to the
    /// penalty pool, and marks the claim exited. Across the claim's lifetime
    /// prior withdrawals plus the returned amount and penalty equal the
    /// entitlement exactly.
    ///
    /// # Errors
    ///
    /// - `NoReward` without a claim
    /// - `InvalidAmount` if the claim has exited or is fully withdrawn
    /// - `InvalidState` if the curve would pay less than already withdrawn
    /// - `TransferFailed` if the payout fails
    pub fn early_exit(
        &mut self,
        caller: &AccountId,
        epoch_id: EpochId,
    ) -> Result<ExitQuote, DistributorError> {
        let now = self.now();

        self.transact(|d| {
            let (Some(epoch), Some(claim)) = (
                d.state.epochs.get(&epoch_id),
                d.state.claims.get(&(epoch_id, *caller)),
            ) else {
                return Err(DistributorError::NoReward(epoch_id));
            };
            if claim.is_exited() || claim.unwithdrawn() == 0 {
                return Err(DistributorError::InvalidAmount);
            }
            let (redeemable, quote) = d.exit_terms(epoch, claim, now)?;

            d.state
                .claims
                .get_mut(&(epoch_id, *caller))
                .ok_or(DistributorError::NoReward(epoch_id))?
                .exit(redeemable)?;
            d.state.penalty_pool = d
                .state
                .penalty_pool
                .checked_add(quote.penalty)
                .ok_or(DistributorError::ArithmeticOverflow)?;
            d.emit(DistributorEvent::Withdrawn {
                epoch_id,
                account: *caller,
                amount: quote.amount,
                penalty: quote.penalty,
            });

            if quote.amount > 0 && !d.reward_token.transfer(caller, quote.amount) {
                warn!(epoch_id, account = %caller, amount = quote.amount, "exit transfer failed");
                return Err(DistributorError::TransferFailed);
            }
            info!(
                epoch_id,
                account = %caller,
                amount = quote.amount,
                penalty = quote.penalty,
                "early exit"
            );
            Ok(quote)
        })
    }
}
