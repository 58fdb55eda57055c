//! Claim ledger: one membership-gated claim per (epoch, account).

use tracing::info;

use ole_core::error::DistributorError;
use ole_core::merkle::MembershipProof;
use ole_core::types::{AccountId, Amount, Claim, EpochId};

use crate::distributor::Distributor;
use crate::events::DistributorEvent;

impl Distributor {
    /// Claim `amount` from `epoch_id` for `caller`, proven by `proof`.
    ///
    /// The claim's linear schedule starts now, not at the epoch start.
    ///
    /// # Errors
    ///
    /// Checked in this order: `EpochNotFound`, `NotStart`, `Expired`,
    /// `InvalidAmount` (zero, or over the epoch's remaining principal),
    /// `AlreadyVested`, `IncorrectMerkleProof`.
    pub fn vest(
        &mut self,
        caller: &AccountId,
        epoch_id: EpochId,
        amount: Amount,
        proof: &MembershipProof,
    ) -> Result<(), DistributorError> {
        let now = self.now();
        let epoch = self
            .state
            .epochs
            .get(&epoch_id)
            .ok_or(DistributorError::EpochNotFound(epoch_id))?;
        if now < epoch.start_time {
            return Err(DistributorError::NotStart(epoch_id));
        }
        if now >= epoch.expire_time {
            return Err(DistributorError::Expired(epoch_id));
        }
        let vested = epoch
            .vested
            .checked_add(amount)
            .filter(|v| amount > 0 && *v <= epoch.total)
            .ok_or(DistributorError::InvalidAmount)?;
        if self.state.claims.contains_key(&(epoch_id, *caller)) {
            return Err(DistributorError::AlreadyVested(epoch_id));
        }
        let leaf = self.membership.leaf(caller, amount);
        if !self.membership.verify(&epoch.merkle_root, &leaf, proof) {
            return Err(DistributorError::IncorrectMerkleProof);
        }

        self.transact(|d| {
            let epoch = d
                .state
                .epochs
                .get_mut(&epoch_id)
                .ok_or(DistributorError::EpochNotFound(epoch_id))?;
            epoch.vested = vested;
            d.state
                .claims
                .insert((epoch_id, *caller), Claim::new(amount, now));
            info!(epoch_id, account = %caller, amount, "vested");
            d.emit(DistributorEvent::Vested {
                epoch_id,
                account: *caller,
                amount,
            });
            Ok(())
        })
    }
}
