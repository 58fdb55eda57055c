//! Core distributor types: accounts, epochs, claims, prices.
//!
//! All amounts are atomic token units held in `u128`.
//! All timestamps are unix seconds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::PERCENT_DIVISOR;
use crate::error::DistributorError;

/// Atomic token amount.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Epoch identifier, starting at [`FIRST_EPOCH_ID`](crate::constants::FIRST_EPOCH_ID).
pub type EpochId = u64;

/// A 32-byte hash value.
///
/// Used for membership roots and leaf digests (BLAKE3).
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes). Root of an empty membership tree.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 32-byte account identifier.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a 64-character hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell accounts apart in logs.
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

impl From<[u8; 32]> for AccountId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Parameters of the exit penalty curve for one epoch.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct CurveParams {
    /// Seconds over which a claim unlocks linearly.
    pub vest_duration: u64,
    /// Linear penalty term, in basis points of [`PERCENT_DIVISOR`].
    pub penalty_base: u64,
    /// Quadratic penalty term, in basis points of [`PERCENT_DIVISOR`].
    pub penalty_add: u64,
}

impl CurveParams {
    /// Whether the parameters satisfy `vest_duration > 0` and
    /// `penalty_base + penalty_add < PERCENT_DIVISOR`.
    pub fn is_valid(&self) -> bool {
        self.vest_duration > 0
            && self
                .penalty_base
                .checked_add(self.penalty_add)
                .is_some_and(|sum| sum < PERCENT_DIVISOR)
    }
}

/// A funded, time-boxed allocation round.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Epoch {
    /// Commitment to the eligible account → amount mapping.
    pub merkle_root: Hash256,
    /// Principal deposited at creation. Immutable.
    pub total: Amount,
    /// Running sum of claimed entitlements. Never exceeds `total`.
    pub vested: Amount,
    /// Claims open at this time (inclusive).
    pub start_time: Timestamp,
    /// Claims close at this time (exclusive).
    pub expire_time: Timestamp,
    /// Vesting and penalty parameters for every claim in this epoch.
    pub curve: CurveParams,
    /// Set once the unclaimed principal has been swept.
    pub recycled: bool,
}

impl Epoch {
    /// Principal nobody has claimed yet.
    pub fn unclaimed(&self) -> Amount {
        self.total.saturating_sub(self.vested)
    }

    /// Whether claims are accepted at `now`.
    pub fn is_open(&self, now: Timestamp) -> bool {
        now >= self.start_time && now < self.expire_time
    }
}

/// Release state of a claim.
///
/// `Exited` is terminal: no transition leaves it.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub enum ClaimStatus {
    /// Still releasing; `withdrawn` units have left the escrow so far.
    Active { withdrawn: Amount },
    /// Finalized by an early exit; `withdrawn` is what the account received in total.
    Exited { withdrawn: Amount },
}

/// One account's entitlement within one epoch.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Claim {
    /// Entitlement fixed at claim time.
    pub amount: Amount,
    /// Anchor of the linear schedule: the moment the account claimed.
    pub vest_start: Timestamp,
    /// Whether the claim is still releasing or was finalized by an exit.
    pub status: ClaimStatus,
}

impl Claim {
    /// A fresh claim with nothing withdrawn.
    pub fn new(amount: Amount, vest_start: Timestamp) -> Self {
        Self {
            amount,
            vest_start,
            status: ClaimStatus::Active { withdrawn: 0 },
        }
    }

    /// Cumulative amount released so far, whatever the status.
    pub fn withdrawn(&self) -> Amount {
        match self.status {
            ClaimStatus::Active { withdrawn } | ClaimStatus::Exited { withdrawn } => withdrawn,
        }
    }

    pub fn is_exited(&self) -> bool {
        matches!(self.status, ClaimStatus::Exited { .. })
    }

    /// Entitlement not yet released (zero once exited).
    pub fn unwithdrawn(&self) -> Amount {
        match self.status {
            ClaimStatus::Active { withdrawn } => self.amount.saturating_sub(withdrawn),
            ClaimStatus::Exited { .. } => 0,
        }
    }

    /// Seconds since the account claimed.
    pub fn elapsed(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.vest_start)
    }

    /// Move `withdrawn` forward to `to` on an active claim.
    ///
    /// # Errors
    ///
    /// [`DistributorError::InvalidAmount`] if the claim has exited, or `to`
    /// would decrease `withdrawn` or exceed `amount`.
    pub fn advance(&mut self, to: Amount) -> Result<(), DistributorError> {
        match self.status {
            ClaimStatus::Active { withdrawn } if to >= withdrawn && to <= self.amount => {
                self.status = ClaimStatus::Active { withdrawn: to };
                Ok(())
            }
            _ => Err(DistributorError::InvalidAmount),
        }
    }

    /// Finalize the claim with `withdrawn = to`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`advance`](Self::advance).
    pub fn exit(&mut self, to: Amount) -> Result<(), DistributorError> {
        self.advance(to)?;
        self.status = ClaimStatus::Exited { withdrawn: to };
        Ok(())
    }
}

/// A price expressed as `numerator / denominator` paired-asset units per
/// reward-token unit.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Price {
    pub numerator: u128,
    pub denominator: u128,
}

impl Price {
    pub fn new(numerator: u128, denominator: u128) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Price derived from pool reserves (`paired / reward`).
    pub fn from_reserves(reward_reserve: u128, paired_reserve: u128) -> Self {
        Self::new(paired_reserve, reward_reserve)
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0 || self.denominator == 0
    }

    /// Paired-asset units needed for `amount` reward units, rounded up.
    ///
    /// Returns `None` on overflow or a zero denominator.
    pub fn quote_ceil(&self, amount: Amount) -> Option<Amount> {
        if self.denominator == 0 {
            return None;
        }
        let product = amount.checked_mul(self.numerator)?;
        Some(product.div_ceil(self.denominator))
    }

    /// Absolute deviation from `reference`, in basis points of `reference`.
    ///
    /// Returns `None` on overflow or a zero reference.
    pub fn deviation_bps(&self, reference: &Price) -> Option<u128> {
        if reference.is_zero() || self.denominator == 0 {
            return None;
        }
        // |a/b - c/d| / (c/d) = |a*d - c*b| / (c*b)
        let lhs = self.numerator.checked_mul(reference.denominator)?;
        let rhs = reference.numerator.checked_mul(self.denominator)?;
        let diff = lhs.abs_diff(rhs);
        diff.checked_mul(PERCENT_DIVISOR as u128)?.checked_div(rhs)
    }
}

/// A governance lock as reported by the lock module.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LockedBalance {
    pub amount: Amount,
    /// Unlock timestamp; zero when no lock exists.
    pub end: Timestamp,
}

/// Result of a hypothetical early exit.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ExitQuote {
    /// Amount the account would receive now.
    pub amount: Amount,
    /// Amount that would be forfeited to the penalty pool.
    pub penalty: Amount,
}
