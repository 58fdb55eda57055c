//! Structured records of committed state changes.

use serde::Serialize;

use ole_core::types::{AccountId, Amount, EpochId, Hash256, Timestamp};

/// One committed state change.
///
/// Appended only when the emitting operation succeeds; together the events
/// are enough to rebuild epoch and claim history off-line.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DistributorEvent {
    EpochCreated {
        epoch_id: EpochId,
        merkle_root: Hash256,
        total: Amount,
        start_time: Timestamp,
        expire_time: Timestamp,
        vest_duration: u64,
        penalty_base: u64,
        penalty_add: u64,
    },
    Vested {
        epoch_id: EpochId,
        account: AccountId,
        amount: Amount,
    },
    /// Ordinary withdrawals report `penalty == 0`.
    Withdrawn {
        epoch_id: EpochId,
        account: AccountId,
        amount: Amount,
        penalty: Amount,
    },
    Recycled {
        epoch_id: EpochId,
        amount: Amount,
    },
    PenaltyWithdrawn {
        to: AccountId,
        amount: Amount,
    },
    Converted {
        epoch_id: EpochId,
        account: AccountId,
        beneficiary: AccountId,
        amount: Amount,
        paired_amount: Amount,
        /// `None` when an existing lock was increased.
        unlock_time: Option<Timestamp>,
    },
    MinLockDurationChanged {
        old: u64,
        new: u64,
    },
    MaxPriceDeviationChanged {
        old: u64,
        new: u64,
    },
    OperatorChanged {
        operator: Option<AccountId>,
    },
}

impl DistributorEvent {
    /// Epoch the event belongs to, if any.
    pub fn epoch_id(&self) -> Option<EpochId> {
        match self {
            Self::EpochCreated { epoch_id, .. }
            | Self::Vested { epoch_id, .. }
            | Self::Withdrawn { epoch_id, .. }
            | Self::Recycled { epoch_id, .. }
            | Self::Converted { epoch_id, .. } => Some(*epoch_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_tagged() {
        let event = DistributorEvent::Withdrawn {
            epoch_id: 1,
            account: AccountId([2; 32]),
            amount: 5,
            penalty: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "withdrawn");
        assert_eq!(json["epoch_id"], 1);
        assert_eq!(json["penalty"], 0);
    }

    #[test]
    fn large_amounts_serialize() {
        let event = DistributorEvent::Converted {
            epoch_id: 3,
            account: AccountId([1; 32]),
            beneficiary: AccountId([4; 32]),
            amount: 10_000_000_000_000_000_000,
            paired_amount: 10_500_000_000_000_000_000,
            unlock_time: None,
        };
        let text = serde_json::to_string(&event).unwrap();
        assert!(text.contains("\"event\":\"converted\""));
        assert!(text.contains("10500000000000000000"));
        assert!(text.contains("\"unlock_time\":null"));
    }

    #[test]
    fn epoch_id_accessor() {
        assert_eq!(
            DistributorEvent::Recycled { epoch_id: 7, amount: 0 }.epoch_id(),
            Some(7)
        );
        assert_eq!(
            DistributorEvent::OperatorChanged { operator: None }.epoch_id(),
            None
        );
    }
}
