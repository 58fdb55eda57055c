//! The aggregate state every distributor operation reads and mutates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ole_core::error::DistributorError;
use ole_core::types::{AccountId, Amount, Claim, Epoch, EpochId};

use crate::config::Settings;

/// All persistent distributor data.
///
/// Owned by [`Distributor`](crate::Distributor); cloned before each
/// state-changing operation so a failure can restore it wholesale.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct DistributorState {
    pub admin: AccountId,
    /// May create epochs alongside the admin.
    pub operator: Option<AccountId>,
    /// Account holding deposited principal and pulled paired assets.
    pub escrow: AccountId,
    /// Highest epoch id assigned so far; 0 before the first epoch.
    pub epoch_count: EpochId,
    pub epochs: BTreeMap<EpochId, Epoch>,
    pub claims: BTreeMap<(EpochId, AccountId), Claim>,
    /// Forfeited amounts not yet withdrawn by the admin.
    pub penalty_pool: Amount,
    pub min_lock_duration: u64,
    pub max_price_deviation_bps: u64,
}

impl DistributorState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            admin: settings.admin,
            operator: settings.operator,
            escrow: settings.escrow,
            epoch_count: 0,
            epochs: BTreeMap::new(),
            claims: BTreeMap::new(),
            penalty_pool: 0,
            min_lock_duration: settings.min_lock_duration,
            max_price_deviation_bps: settings.max_price_deviation_bps,
        }
    }

    /// Encode as a bincode snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DistributorError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| DistributorError::Snapshot(e.to_string()))
    }

    /// Decode a snapshot produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DistributorError> {
        let (state, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| DistributorError::Snapshot(e.to_string()))?;
        Ok(state)
    }

    /// Sum of outstanding obligations held in escrow: unwithdrawn claim
    /// balances, unclaimed principal of unrecycled epochs, and the penalty pool.
    pub fn escrow_liability(&self) -> Option<Amount> {
        let claimed = self
            .claims
            .values()
            .try_fold(0u128, |acc, c| acc.checked_add(c.unwithdrawn()))?;
        let unclaimed = self
            .epochs
            .values()
            .filter(|e| !e.recycled)
            .try_fold(0u128, |acc, e| acc.checked_add(e.unclaimed()))?;
        claimed.checked_add(unclaimed)?.checked_add(self.penalty_pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ole_core::types::{CurveParams, Hash256};

    fn settings() -> Settings {
        Settings::new(AccountId([1; 32]), AccountId([9; 32]))
    }

    fn epoch(total: Amount, vested: Amount) -> Epoch {
        Epoch {
            merkle_root: Hash256([7; 32]),
            total,
            vested,
            start_time: 0,
            expire_time: 100,
            curve: CurveParams {
                vest_duration: 50,
                penalty_base: 2_000,
                penalty_add: 6_000,
            },
            recycled: false,
        }
    }

    #[test]
    fn new_state_is_empty() {
        let state = DistributorState::new(&settings());
        assert_eq!(state.epoch_count, 0);
        assert!(state.epochs.is_empty());
        assert_eq!(state.penalty_pool, 0);
        assert_eq!(state.escrow_liability(), Some(0));
    }

    #[test]
    fn snapshot_round_trip() {
        let mut state = DistributorState::new(&settings());
        state.epochs.insert(1, epoch(60, 10));
        state.claims.insert((1, AccountId([2; 32])), Claim::new(10, 5));
        state.epoch_count = 1;
        state.penalty_pool = 3;

        let bytes = state.to_bytes().unwrap();
        assert_eq!(DistributorState::from_bytes(&bytes).unwrap(), state);
    }

    #[test]
    fn truncated_snapshot_rejected() {
        let state = DistributorState::new(&settings());
        let bytes = state.to_bytes().unwrap();
        let err = DistributorState::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert_eq!(err.code(), "Snapshot");
    }

    #[test]
    fn liability_skips_recycled_epochs() {
        let mut state = DistributorState::new(&settings());
        let mut claim = Claim::new(10, 0);
        claim.advance(4).unwrap();
        state.claims.insert((1, AccountId([2; 32])), claim);
        state.epochs.insert(1, epoch(60, 10));
        let mut swept = epoch(30, 0);
        swept.recycled = true;
        state.epochs.insert(2, swept);
        state.penalty_pool = 1;
        assert_eq!(state.escrow_liability(), Some(6 + 50 + 1));
    }
}
