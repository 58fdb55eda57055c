//! Epoch registry: funded allocation rounds and the admin sweeps over them.

use tracing::{info, warn};

use ole_core::error::DistributorError;
use ole_core::types::{AccountId, Amount, CurveParams, Epoch, EpochId, Hash256, Timestamp};

use crate::distributor::Distributor;
use crate::events::DistributorEvent;

/// Parameters of an epoch to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEpoch {
    pub merkle_root: Hash256,
    /// Principal pulled from the creator into escrow.
    pub total: Amount,
    pub start_time: Timestamp,
    pub expire_time: Timestamp,
    pub curve: CurveParams,
}

impl Distributor {
    /// Create and fund a new epoch, returning its id.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` unless `caller` is the admin or operator
    /// - `InvalidTime` unless `start_time < expire_time`, `expire_time > now`
    ///   and `vest_duration > 0`
    /// - `InvalidAmount` if `total == 0` or `penalty_base + penalty_add >= 10_000`
    /// - `TransferFailed` if the principal cannot be pulled from `caller`
    pub fn create_epoch(
        &mut self,
        caller: &AccountId,
        params: NewEpoch,
    ) -> Result<EpochId, DistributorError> {
        self.require_epoch_creator(caller)?;
        let now = self.now();
        if params.start_time >= params.expire_time
            || params.expire_time <= now
            || params.curve.vest_duration == 0
        {
            return Err(DistributorError::InvalidTime);
        }
        if params.total == 0 || !params.curve.is_valid() {
            return Err(DistributorError::InvalidAmount);
        }

        self.transact(|d| {
            let id = d
                .state
                .epoch_count
                .checked_add(1)
                .ok_or(DistributorError::ArithmeticOverflow)?;
            d.state.epoch_count = id;
            d.state.epochs.insert(
                id,
                Epoch {
                    merkle_root: params.merkle_root,
                    total: params.total,
                    vested: 0,
                    start_time: params.start_time,
                    expire_time: params.expire_time,
                    curve: params.curve,
                    recycled: false,
                },
            );

            let escrow = d.state.escrow;
            if !d.reward_token.transfer_from(caller, &escrow, params.total) {
                warn!(epoch_id = id, total = params.total, "principal deposit failed");
                return Err(DistributorError::TransferFailed);
            }

            info!(
                epoch_id = id,
                total = params.total,
                start_time = params.start_time,
                expire_time = params.expire_time,
                vest_duration = params.curve.vest_duration,
                "epoch created"
            );
            d.emit(DistributorEvent::EpochCreated {
                epoch_id: id,
                merkle_root: params.merkle_root,
                total: params.total,
                start_time: params.start_time,
                expire_time: params.expire_time,
                vest_duration: params.curve.vest_duration,
                penalty_base: params.curve.penalty_base,
                penalty_add: params.curve.penalty_add,
            });
            Ok(id)
        })
    }

    /// Sweep the unclaimed principal of expired epochs to the admin.
    ///
    /// Returns the summed amount, paid in a single transfer.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` unless `caller` is the admin
    /// - `InvalidAmount` for an empty id list
    /// - `EpochNotFound`, `InvalidTime` (not yet expired), `AlreadyRecycled`
    ///   (including an id repeated within `epoch_ids`) for any listed id
    pub fn recycle(
        &mut self,
        caller: &AccountId,
        epoch_ids: &[EpochId],
    ) -> Result<Amount, DistributorError> {
        self.require_admin(caller)?;
        if epoch_ids.is_empty() {
            return Err(DistributorError::InvalidAmount);
        }
        let now = self.now();

        self.transact(|d| {
            let mut total: Amount = 0;
            for &id in epoch_ids {
                let epoch = d
                    .state
                    .epochs
                    .get_mut(&id)
                    .ok_or(DistributorError::EpochNotFound(id))?;
                if now < epoch.expire_time {
                    return Err(DistributorError::InvalidTime);
                }
                if epoch.recycled {
                    return Err(DistributorError::AlreadyRecycled(id));
                }
                let shortfall = epoch.unclaimed();
                epoch.recycled = true;
                total = total
                    .checked_add(shortfall)
                    .ok_or(DistributorError::ArithmeticOverflow)?;
                d.emit(DistributorEvent::Recycled {
                    epoch_id: id,
                    amount: shortfall,
                });
            }

            if total > 0 && !d.reward_token.transfer(caller, total) {
                warn!(amount = total, "recycle transfer failed");
                return Err(DistributorError::TransferFailed);
            }
            info!(epochs = epoch_ids.len(), amount = total, "epochs recycled");
            Ok(total)
        })
    }

    /// Pay the whole penalty pool to the admin and reset it.
    ///
    /// # Errors
    ///
    /// `Unauthorized` unless `caller` is the admin; `InvalidAmount` when the
    /// pool is empty.
    pub fn withdraw_penalty(&mut self, caller: &AccountId) -> Result<Amount, DistributorError> {
        self.require_admin(caller)?;
        if self.state.penalty_pool == 0 {
            return Err(DistributorError::InvalidAmount);
        }

        self.transact(|d| {
            let amount = std::mem::take(&mut d.state.penalty_pool);
            if !d.reward_token.transfer(caller, amount) {
                warn!(amount, "penalty transfer failed");
                return Err(DistributorError::TransferFailed);
            }
            info!(amount, "penalty withdrawn");
            d.emit(DistributorEvent::PenaltyWithdrawn { to: *caller, amount });
            Ok(amount)
        })
    }
}
