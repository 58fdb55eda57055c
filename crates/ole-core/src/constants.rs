//! Protocol constants. All amounts are in atomic token units.

/// One whole reward token (18 decimals).
pub const TOKEN: u128 = 1_000_000_000_000_000_000;

/// Divisor for penalty parameters, in basis points.
///
/// `penalty_base + penalty_add` must stay strictly below this value.
///
/// # Examples
///
/// ```
/// use ole_core::constants::PERCENT_DIVISOR;
/// // 20% base + 60% quadratic add = 80% forfeited at the moment of claim.
/// assert!(2_000 + 6_000 < PERCENT_DIVISOR);
/// ```
pub const PERCENT_DIVISOR: u64 = 10_000;

/// Fixed-point precision of the penalty curve (parts-per-billion).
pub const CURVE_PRECISION: u64 = 1_000_000_000;

/// Seconds in a day.
pub const DAY: u64 = 86_400;

/// Longest lock the governance module accepts, measured from now.
pub const MAX_LOCK_DURATION: u64 = 4 * 365 * DAY;

/// Default minimum lock duration for conversions.
pub const DEFAULT_MIN_LOCK_DURATION: u64 = 30 * DAY;

/// Default tolerated gap between spot and reference price, in basis points.
pub const DEFAULT_MAX_PRICE_DEVIATION_BPS: u64 = 1_000;

/// Identifier assigned to the first epoch.
pub const FIRST_EPOCH_ID: u64 = 1;
