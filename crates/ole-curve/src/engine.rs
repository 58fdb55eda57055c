//! Curve engine implementing the [`ExitCurve`] trait.
//!
//! The remaining share of the vesting window is evaluated once in
//! fixed point (`CURVE_PRECISION`), then the linear and quadratic penalty
//! terms are blended from it. All arithmetic is integer-only with u128
//! intermediates; overflow is reported, never wrapped.

use ole_core::constants::{CURVE_PRECISION, PERCENT_DIVISOR};
use ole_core::error::CurveError;
use ole_core::traits::ExitCurve;
use ole_core::types::{Amount, CurveParams};

/// The production exit curve.
///
/// Implements [`ExitCurve`] with:
/// - Linear release floored to whole units
/// - Penalty fraction `(add * r^2 + base * r) / PERCENT_DIVISOR`
/// - `redeemable = floor(amount * (1 - fraction))`
#[derive(Debug, Clone, Copy, Default)]
pub struct PenaltyCurve;

impl PenaltyCurve {
    pub fn new() -> Self {
        Self
    }
}

/// Remaining share of the vesting window in parts of [`CURVE_PRECISION`].
///
/// `CURVE_PRECISION` at `elapsed = 0`, zero once `elapsed >= vest_duration`.
pub fn remaining_fraction(elapsed: u64, vest_duration: u64) -> Result<u64, CurveError> {
    if vest_duration == 0 {
        return Err(CurveError::ZeroDuration);
    }
    if elapsed >= vest_duration {
        return Ok(0);
    }
    // left < vest_duration, so the quotient is below CURVE_PRECISION.
    let left = u128::from(vest_duration - elapsed);
    Ok((left * u128::from(CURVE_PRECISION) / u128::from(vest_duration)) as u64)
}

fn check_params(params: &CurveParams) -> Result<(), CurveError> {
    if params.vest_duration == 0 {
        return Err(CurveError::ZeroDuration);
    }
    if !params.is_valid() {
        return Err(CurveError::ParamsOutOfRange {
            base: params.penalty_base,
            add: params.penalty_add,
            divisor: PERCENT_DIVISOR,
        });
    }
    Ok(())
}

impl ExitCurve for PenaltyCurve {
    fn vested_amount(
        &self,
        amount: Amount,
        elapsed: u64,
        vest_duration: u64,
    ) -> Result<Amount, CurveError> {
        if vest_duration == 0 {
            return Err(CurveError::ZeroDuration);
        }
        if elapsed >= vest_duration {
            return Ok(amount);
        }
        amount
            .checked_mul(u128::from(elapsed))
            .map(|v| v / u128::from(vest_duration))
            .ok_or(CurveError::ArithmeticOverflow)
    }

    fn penalty_fraction(&self, elapsed: u64, params: &CurveParams) -> Result<u64, CurveError> {
        check_params(params)?;
        let r = u128::from(remaining_fraction(elapsed, params.vest_duration)?);
        if r == 0 {
            return Ok(0);
        }
        let precision = u128::from(CURVE_PRECISION);
        let quadratic = r * r / precision;
        let weighted = u128::from(params.penalty_add) * quadratic + u128::from(params.penalty_base) * r;
        // base + add < PERCENT_DIVISOR and r <= CURVE_PRECISION keep this below r.
        Ok((weighted / u128::from(PERCENT_DIVISOR)) as u64)
    }

    fn redeemable(
        &self,
        amount: Amount,
        elapsed: u64,
        params: &CurveParams,
    ) -> Result<Amount, CurveError> {
        let fraction = self.penalty_fraction(elapsed, params)?;
        if fraction == 0 {
            return Ok(amount);
        }
        let keep = u128::from(CURVE_PRECISION - fraction);
        amount
            .checked_mul(keep)
            .map(|v| v / u128::from(CURVE_PRECISION))
            .ok_or(CurveError::ArithmeticOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ole_core::constants::{DAY, TOKEN};
    use proptest::prelude::*;

    const VEST: u64 = 90 * DAY;

    fn curve() -> PenaltyCurve {
        PenaltyCurve::new()
    }

    fn reference() -> CurveParams {
        CurveParams {
            vest_duration: VEST,
            penalty_base: 2_000,
            penalty_add: 6_000,
        }
    }

    // --- remaining_fraction ---

    #[test]
    fn remaining_at_bounds() {
        assert_eq!(remaining_fraction(0, VEST).unwrap(), CURVE_PRECISION);
        assert_eq!(remaining_fraction(VEST, VEST).unwrap(), 0);
        assert_eq!(remaining_fraction(VEST * 10, VEST).unwrap(), 0);
        assert_eq!(remaining_fraction(45 * DAY, VEST).unwrap(), CURVE_PRECISION / 2);
    }

    #[test]
    fn remaining_rejects_zero_duration() {
        assert_eq!(remaining_fraction(0, 0), Err(CurveError::ZeroDuration));
    }

    // --- vested_amount ---

    #[test]
    fn linear_release_thirds() {
        let c = curve();
        let amount = 10 * TOKEN;
        let first = c.vested_amount(amount, 30 * DAY, VEST).unwrap();
        let second = c.vested_amount(amount, 60 * DAY, VEST).unwrap();
        let last = c.vested_amount(amount, 90 * DAY, VEST).unwrap();
        assert_eq!(first, 3_333_333_333_333_333_333);
        assert_eq!(second - first, 3_333_333_333_333_333_333);
        assert_eq!(last - second, 3_333_333_333_333_333_334);
    }

    #[test]
    fn linear_release_bounds() {
        let c = curve();
        assert_eq!(c.vested_amount(10 * TOKEN, 0, VEST).unwrap(), 0);
        assert_eq!(c.vested_amount(10 * TOKEN, VEST + 1, VEST).unwrap(), 10 * TOKEN);
        assert_eq!(c.vested_amount(1, 0, 0), Err(CurveError::ZeroDuration));
    }

    #[test]
    fn linear_release_overflow_reported() {
        assert_eq!(
            curve().vested_amount(u128::MAX, VEST - 1, VEST),
            Err(CurveError::ArithmeticOverflow)
        );
    }

    // --- penalty_fraction ---

    #[test]
    fn fraction_at_claim_is_base_plus_add() {
        let f = curve().penalty_fraction(0, &reference()).unwrap();
        assert_eq!(f, 800_000_000);
    }

    #[test]
    fn fraction_zero_at_full_vest() {
        assert_eq!(curve().penalty_fraction(VEST, &reference()).unwrap(), 0);
    }

    #[test]
    fn fraction_rejects_bad_params() {
        let bad = CurveParams {
            penalty_base: 4_000,
            ..reference()
        };
        assert_eq!(
            curve().penalty_fraction(0, &bad),
            Err(CurveError::ParamsOutOfRange {
                base: 4_000,
                add: 6_000,
                divisor: PERCENT_DIVISOR
            })
        );
        let zero = CurveParams {
            vest_duration: 0,
            ..reference()
        };
        assert_eq!(curve().penalty_fraction(0, &zero), Err(CurveError::ZeroDuration));
    }

    // --- redeemable / exit_penalty ---

    #[test]
    fn exit_at_claim() {
        let c = curve();
        let amount = 10 * TOKEN;
        assert_eq!(c.redeemable(amount, 0, &reference()).unwrap(), 2 * TOKEN);
        assert_eq!(c.exit_penalty(amount, 0, &reference()).unwrap(), 8 * TOKEN);
    }

    #[test]
    fn exit_mid_term() {
        let c = curve();
        let amount = 10 * TOKEN;
        // r = 1/2: 0.6 * 0.25 + 0.2 * 0.5 = 0.25 forfeited.
        assert_eq!(c.redeemable(amount, 45 * DAY, &reference()).unwrap(), 7_500_000_000_000_000_000);
        assert_eq!(c.exit_penalty(amount, 45 * DAY, &reference()).unwrap(), 2_500_000_000_000_000_000);
    }

    #[test]
    fn exit_on_last_day() {
        let c = curve();
        let amount = 10 * TOKEN;
        let penalty = c.exit_penalty(amount, 89 * DAY, &reference()).unwrap();
        assert_eq!(penalty, 22_962_950_000_000_000);
        assert_eq!(c.redeemable(amount, 89 * DAY, &reference()).unwrap() + penalty, amount);
    }

    #[test]
    fn exit_after_vest_is_free() {
        let c = curve();
        assert_eq!(c.exit_penalty(10 * TOKEN, VEST, &reference()).unwrap(), 0);
        assert_eq!(c.redeemable(u128::MAX, VEST, &reference()).unwrap(), u128::MAX);
    }

    #[test]
    fn zero_penalty_params_redeem_everything() {
        let free = CurveParams {
            vest_duration: VEST,
            penalty_base: 0,
            penalty_add: 0,
        };
        assert_eq!(curve().redeemable(10 * TOKEN, 0, &free).unwrap(), 10 * TOKEN);
    }

    #[test]
    fn curve_is_object_safe() {
        let c: &dyn ExitCurve = &curve();
        assert_eq!(c.redeemable(100, VEST, &reference()).unwrap(), 100);
    }

    // --- proptest ---

    fn params_strategy() -> impl Strategy<Value = CurveParams> {
        (1u64..=4 * 365 * DAY, 0u64..PERCENT_DIVISOR)
            .prop_flat_map(|(vest, base)| {
                (Just(vest), Just(base), 0u64..(PERCENT_DIVISOR - base))
            })
            .prop_map(|(vest_duration, penalty_base, penalty_add)| CurveParams {
                vest_duration,
                penalty_base,
                penalty_add,
            })
    }

    proptest! {
        #[test]
        fn redeemable_monotonic_in_elapsed(
            params in params_strategy(),
            amount in 0u128..=1_000_000_000 * TOKEN,
            a in 0u64..=5 * 365 * DAY,
            b in 0u64..=5 * 365 * DAY,
        ) {
            let c = curve();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let r_lo = c.redeemable(amount, lo, &params).unwrap();
            let r_hi = c.redeemable(amount, hi, &params).unwrap();
            prop_assert!(r_lo <= r_hi, "redeemable fell: r({})={} > r({})={}", lo, r_lo, hi, r_hi);
        }

        #[test]
        fn redeemable_never_below_linear_release(
            params in params_strategy(),
            amount in 0u128..=1_000_000_000 * TOKEN,
            elapsed in 0u64..=5 * 365 * DAY,
        ) {
            let c = curve();
            let redeemable = c.redeemable(amount, elapsed, &params).unwrap();
            let vested = c.vested_amount(amount, elapsed, params.vest_duration).unwrap();
            prop_assert!(redeemable >= vested, "redeemable {} < vested {}", redeemable, vested);
            prop_assert!(redeemable <= amount);
        }

        #[test]
        fn redeemable_plus_penalty_is_amount(
            params in params_strategy(),
            amount in 0u128..=1_000_000_000 * TOKEN,
            elapsed in 0u64..=5 * 365 * DAY,
        ) {
            let c = curve();
            let redeemable = c.redeemable(amount, elapsed, &params).unwrap();
            let penalty = c.exit_penalty(amount, elapsed, &params).unwrap();
            prop_assert_eq!(redeemable + penalty, amount);
        }

        #[test]
        fn fraction_bounded_by_parameters(
            params in params_strategy(),
            elapsed in 0u64..=5 * 365 * DAY,
        ) {
            let f = curve().penalty_fraction(elapsed, &params).unwrap();
            let cap = (params.penalty_base + params.penalty_add) * (CURVE_PRECISION / PERCENT_DIVISOR);
            prop_assert!(f <= cap, "fraction {} above cap {}", f, cap);
        }

        #[test]
        fn vested_monotonic_and_bounded(
            amount in 0u128..=1_000_000_000 * TOKEN,
            vest in 1u64..=4 * 365 * DAY,
            a in 0u64..=5 * 365 * DAY,
            b in 0u64..=5 * 365 * DAY,
        ) {
            let c = curve();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let v_lo = c.vested_amount(amount, lo, vest).unwrap();
            let v_hi = c.vested_amount(amount, hi, vest).unwrap();
            prop_assert!(v_lo <= v_hi);
            prop_assert!(v_hi <= amount);
        }
    }
}
