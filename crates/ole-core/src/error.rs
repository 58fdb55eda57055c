//! Error types for the reward distributor.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("zero vest duration")] ZeroDuration,
    #[error("penalty parameters out of range: {base} + {add} >= {divisor}")] ParamsOutOfRange { base: u64, add: u64, divisor: u64 },
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("price unavailable: {0}")] Unavailable(String),
    #[error("zero price")] ZeroPrice,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("no lock for account {0}")] NoLock(String),
    #[error("lock already exists for account {0}")] AlreadyLocked(String),
    #[error("escrow could not fund the lock")] Underfunded,
    #[error("lock rejected: {0}")] Rejected(String),
}

/// Rejection reasons for distributor operations.
///
/// Every variant maps to a stable identifier via [`DistributorError::code`],
/// so callers can assert on the exact cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistributorError {
    #[error("caller {0} is not authorized")] Unauthorized(String),
    #[error("invalid time")] InvalidTime,
    #[error("invalid amount")] InvalidAmount,
    #[error("epoch {0} does not exist")] EpochNotFound(u64),
    #[error("epoch {0} has not started")] NotStart(u64),
    #[error("epoch {0} has expired")] Expired(u64),
    #[error("already vested in epoch {0}")] AlreadyVested(u64),
    #[error("incorrect merkle proof")] IncorrectMerkleProof,
    #[error("no reward in epoch {0}")] NoReward(u64),
    #[error("epoch {0} already recycled")] AlreadyRecycled(u64),
    #[error("exceeds max: required {required}, allowed {allowed}")] ExceedMax { required: u128, allowed: u128 },
    #[error("token transfer failed")] TransferFailed,
    #[error("invalid state: redeemable {redeemable} below withdrawn {withdrawn}")] InvalidState { redeemable: u128, withdrawn: u128 },
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("snapshot: {0}")] Snapshot(String),
    #[error(transparent)] Curve(#[from] CurveError),
    #[error(transparent)] Oracle(#[from] OracleError),
    #[error(transparent)] Lock(#[from] LockError),
}

impl DistributorError {
    /// Stable identifier for the failure cause.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "Unauthorized",
            Self::InvalidTime => "InvalidTime",
            Self::InvalidAmount => "InvalidAmount",
            Self::EpochNotFound(_) => "EpochNotFound",
            Self::NotStart(_) => "NotStart",
            Self::Expired(_) => "Expired",
            Self::AlreadyVested(_) => "AlreadyVested",
            Self::IncorrectMerkleProof => "IncorrectMerkleProof",
            Self::NoReward(_) => "NoReward",
            Self::AlreadyRecycled(_) => "AlreadyRecycled",
            Self::ExceedMax { .. } => "ExceedMax",
            Self::TransferFailed => "TransferFailed",
            Self::InvalidState { .. } => "InvalidState",
            Self::ArithmeticOverflow => "ArithmeticOverflow",
            Self::Snapshot(_) => "Snapshot",
            Self::Curve(_) => "CurveError",
            Self::Oracle(_) => "OracleError",
            Self::Lock(_) => "LockError",
        }
    }
}
