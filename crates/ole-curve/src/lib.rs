//! # ole-curve: Vesting and early-exit penalty curve.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Linear release**: a claim unlocks `amount * elapsed / vest_duration`,
//!   capped at `amount`.
//! - **Exit penalty**: with `r` the remaining fraction of the vesting window,
//!   an early exit forfeits `(add * r^2 + base * r) / PERCENT_DIVISOR` of the
//!   entitlement. The penalty is front-loaded and reaches zero exactly when
//!   vesting completes.

pub mod engine;

pub use engine::{remaining_fraction, PenaltyCurve};
