use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::error::StrReturnsError;
use crate::types::{Money, Rate};
use crate::StrReturnsResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const STEP_THRESHOLD: Decimal = dec!(0.000000000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;

/// Lowest rate the solvers will probe. Below this the per-period growth
/// factor 1/(1+r) raised to 20+ periods leaves the Decimal range.
const RATE_FLOOR: Rate = dec!(-0.9);
const RATE_CEILING: Rate = dec!(1000000);

/// Net Present Value of a series of periodic cash flows (index 0 = today).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> StrReturnsResult<Money> {
    NpvPoint::evaluate(rate, cash_flows).map(|n| n.value)
}

/// NPV and its first derivative with respect to the rate, evaluated together
/// so the solvers only walk the series once per iteration.
#[derive(Debug, Clone, Copy)]
struct NpvPoint {
    value: Money,
    derivative: Money,
}

impl NpvPoint {
    fn evaluate(rate: Rate, cash_flows: &[Money]) -> StrReturnsResult<Self> {
        if rate <= dec!(-1) {
            return Err(StrReturnsError::InvalidInput {
                field: "rate".into(),
                reason: "Discount rate must be greater than -100%".into(),
            });
        }

        // Work with v = 1/(1+r) so large rates underflow towards zero
        // instead of overflowing the discount factor.
        let v = Decimal::ONE / (Decimal::ONE + rate);
        let overflow = |t: usize| StrReturnsError::DivisionByZero {
            context: format!("NPV discount factor overflow at period {t}"),
        };

        let mut value = Decimal::ZERO;
        let mut derivative = Decimal::ZERO;
        let mut v_t = Decimal::ONE;

        for (t, cf) in cash_flows.iter().enumerate() {
            if t > 0 {
                v_t = v_t.checked_mul(v).ok_or_else(|| overflow(t))?;
            }
            let term = cf.checked_mul(v_t).ok_or_else(|| overflow(t))?;
            value = value.checked_add(term).ok_or_else(|| overflow(t))?;
            if t > 0 {
                // d/dr [cf * v^t] = -t * cf * v^(t+1)
                let d = Decimal::from(t as i64)
                    .checked_mul(term)
                    .and_then(|x| x.checked_mul(v))
                    .ok_or_else(|| overflow(t))?;
                derivative -= d;
            }
        }

        Ok(NpvPoint { value, derivative })
    }
}

/// Internal Rate of Return using Newton-Raphson, falling back to bisection
/// when Newton stalls or leaves the solvable range.
pub fn irr(cash_flows: &[Money], guess: Rate) -> StrReturnsResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(StrReturnsError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    let has_negative = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_positive = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if !has_negative || !has_positive {
        return Err(StrReturnsError::InsufficientData(
            "IRR requires at least one negative and one positive cash flow".into(),
        ));
    }

    match newton_irr(cash_flows, guess) {
        Ok(rate) => Ok(rate),
        Err(e) => {
            warn!(error = %e, "Newton-Raphson IRR failed, falling back to bisection");
            bisection_irr(cash_flows)
        }
    }
}

fn newton_irr(cash_flows: &[Money], guess: Rate) -> StrReturnsResult<Rate> {
    let mut rate = guess.clamp(RATE_FLOOR, RATE_CEILING);

    for i in 0..MAX_IRR_ITERATIONS {
        let n = NpvPoint::evaluate(rate, cash_flows)?;

        if n.value.abs() < CONVERGENCE_THRESHOLD {
            debug!(iterations = i, %rate, "IRR converged (Newton-Raphson)");
            return Ok(rate);
        }

        if n.derivative.is_zero() {
            return Err(StrReturnsError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: n.value,
            });
        }

        let step = n.value / n.derivative;
        rate -= step;

        // Guard against divergence
        if rate < RATE_FLOOR {
            rate = RATE_FLOOR;
        } else if rate > RATE_CEILING {
            rate = RATE_CEILING;
        }

        if step.abs() < STEP_THRESHOLD {
            debug!(iterations = i, %rate, "IRR converged on step size (Newton-Raphson)");
            return Ok(rate);
        }
    }

    Err(StrReturnsError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv(rate, cash_flows).unwrap_or(Decimal::MAX),
    })
}

fn bisection_irr(cash_flows: &[Money]) -> StrReturnsResult<Rate> {
    let mut lo = RATE_FLOOR;
    let mut hi = dec!(1);
    let mut f_lo = NpvPoint::evaluate(lo, cash_flows)?.value;
    let mut f_hi = NpvPoint::evaluate(hi, cash_flows)?.value;

    // Widen the upper bracket until the sign flips.
    while f_lo.is_sign_negative() == f_hi.is_sign_negative() && hi < RATE_CEILING {
        hi *= dec!(2);
        f_hi = NpvPoint::evaluate(hi, cash_flows)?.value;
    }
    if f_lo.is_sign_negative() == f_hi.is_sign_negative() {
        return Err(StrReturnsError::ConvergenceFailure {
            function: "IRR (bisection)".into(),
            iterations: 0,
            last_delta: f_hi,
        });
    }

    for i in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let f_mid = NpvPoint::evaluate(mid, cash_flows)?.value;

        if f_mid.abs() < CONVERGENCE_THRESHOLD || (hi - lo) < STEP_THRESHOLD {
            debug!(iterations = i, rate = %mid, "IRR converged (bisection)");
            return Ok(mid);
        }

        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(StrReturnsError::ConvergenceFailure {
        function: "IRR (bisection)".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta: f_lo,
    })
}

/// Cash-flow series for a flat annual profit: `-initial` at t=0 followed by
/// `years` identical inflows.
pub fn flat_cash_flows(initial: Money, annual: Money, years: u32) -> Vec<Money> {
    let mut flows = Vec::with_capacity(years as usize + 1);
    flows.push(-initial);
    flows.extend(std::iter::repeat(annual).take(years as usize));
    flows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        let cfs = vec![dec!(-100), dec!(50)];
        assert!(npv(dec!(-1), &cfs).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_flat_twenty_years() {
        // 20 x 10'000 against 100'000 => annuity factor 10 => ~7.75%
        let cfs = flat_cash_flows(dec!(100000), dec!(10000), 20);
        assert_eq!(cfs.len(), 21);
        let result = irr(&cfs, dec!(0.10)).unwrap();
        assert!((result - dec!(0.0775)).abs() < dec!(0.001), "got {result}");
    }

    #[test]
    fn test_irr_negative_rate() {
        // Flows sum to less than the outlay => negative IRR
        let cfs = flat_cash_flows(dec!(120000), dec!(1000), 20);
        let result = irr(&cfs, dec!(0.10)).unwrap();
        assert!(result < Decimal::ZERO && result > dec!(-0.2), "got {result}");
    }

    #[test]
    fn test_irr_very_high_rate() {
        // Payback many times over in year one
        let cfs = flat_cash_flows(dec!(1000), dec!(50000), 20);
        let result = irr(&cfs, dec!(0.10)).unwrap();
        assert!((result - dec!(50)).abs() < dec!(0.01), "got {result}");
        let check = npv(result, &cfs).unwrap();
        assert!(check.abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_requires_sign_change() {
        let cfs = vec![dec!(-100), dec!(-10), dec!(-10)];
        assert!(matches!(
            irr(&cfs, dec!(0.10)),
            Err(StrReturnsError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_bisection_matches_newton() {
        let cfs = flat_cash_flows(dec!(120000), dec!(39043.7), 20);
        let newton = irr(&cfs, dec!(0.10)).unwrap();
        let bisect = bisection_irr(&cfs).unwrap();
        assert!((newton - bisect).abs() < dec!(0.000001));
    }
}
