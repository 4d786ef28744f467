//! Level-payment (EMI) amortization and its inverse.
//!
//! Rates are annual percentages as quoted in the policy catalog and are
//! converted to a monthly periodic rate internally. Results are rounded to
//! the currency's minor unit ([`CURRENCY_DP`] decimal places), midpoint
//! away from zero.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::CreditEngineError;
use crate::types::{Money, Percent, Rate};
use crate::CreditEngineResult;

/// Decimal places of the currency's minor unit.
pub const CURRENCY_DP: u32 = 2;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT_SCALE: Decimal = dec!(100);

/// Round a monetary amount to the currency's minor unit.
pub fn round_currency(amount: Money) -> Money {
    amount.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Monthly periodic rate for an annual percentage (12 → 0.01).
pub fn monthly_rate(annual_rate: Percent) -> Rate {
    annual_rate / MONTHS_PER_YEAR / PERCENT_SCALE
}

/// Level installment amortizing `principal` over `term_months`.
///
/// A zero term is a revolving product with no amortized obligation and
/// yields zero.
pub fn compute_installment(
    principal: Money,
    annual_rate: Percent,
    term_months: u32,
) -> CreditEngineResult<Money> {
    installment_exact(principal, annual_rate, term_months).map(round_currency)
}

/// Largest principal whose level installment does not exceed
/// `max_installment`. Zero when the term is zero or the installment
/// ceiling is not positive.
pub fn compute_max_principal(
    max_installment: Money,
    annual_rate: Percent,
    term_months: u32,
) -> CreditEngineResult<Money> {
    max_principal_exact(max_installment, annual_rate, term_months).map(round_currency)
}

/// Unrounded installment. `max_principal_exact` is its exact inverse.
pub fn installment_exact(
    principal: Money,
    annual_rate: Percent,
    term_months: u32,
) -> CreditEngineResult<Money> {
    if term_months == 0 {
        return Ok(Decimal::ZERO);
    }

    let periods = Decimal::from(term_months);
    let r = monthly_rate(annual_rate);
    let factor = growth_factor(r, term_months)?;
    let annuity = factor - Decimal::ONE;

    if r.is_zero() || annuity.is_zero() {
        return Ok(principal / periods);
    }

    principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(annuity))
        .ok_or_else(|| CreditEngineError::overflow("installment"))
}

/// Unrounded maximum principal for an installment ceiling.
pub fn max_principal_exact(
    max_installment: Money,
    annual_rate: Percent,
    term_months: u32,
) -> CreditEngineResult<Money> {
    if term_months == 0 || max_installment <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let periods = Decimal::from(term_months);
    let r = monthly_rate(annual_rate);
    let factor = growth_factor(r, term_months)?;
    let annuity = factor - Decimal::ONE;

    if r.is_zero() || annuity.is_zero() {
        return max_installment
            .checked_mul(periods)
            .ok_or_else(|| CreditEngineError::overflow("max principal"));
    }

    let denominator = r
        .checked_mul(factor)
        .ok_or_else(|| CreditEngineError::overflow("max principal denominator"))?;
    if denominator.is_zero() {
        return Err(CreditEngineError::ArithmeticOverflow {
            context: "max principal denominator is zero".into(),
        });
    }

    max_installment
        .checked_mul(annuity)
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| CreditEngineError::overflow("max principal"))
}

/// (1 + r)^n
fn growth_factor(r: Rate, term_months: u32) -> CreditEngineResult<Decimal> {
    (Decimal::ONE + r)
        .checked_powu(u64::from(term_months))
        .ok_or_else(|| CreditEngineError::overflow("compound growth factor"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_installment_basic() {
        // 100k at 12% p.a. over 12 months: textbook EMI 8,884.88
        let emi = compute_installment(dec!(100_000), dec!(12), 12).unwrap();
        assert_eq!(emi, dec!(8884.88));
    }

    #[test]
    fn test_installment_zero_term_is_revolving() {
        let emi = compute_installment(dec!(100_000), dec!(12), 0).unwrap();
        assert_eq!(emi, Decimal::ZERO);
    }

    #[test]
    fn test_installment_zero_rate_is_straight_line() {
        let emi = compute_installment(dec!(120_000), Decimal::ZERO, 24).unwrap();
        assert_eq!(emi, dec!(5000));
    }

    #[test]
    fn test_max_principal_zero_term() {
        let p = compute_max_principal(dec!(10_000), dec!(12), 0).unwrap();
        assert_eq!(p, Decimal::ZERO);
    }

    #[test]
    fn test_max_principal_non_positive_ceiling() {
        assert_eq!(
            compute_max_principal(Decimal::ZERO, dec!(12), 36).unwrap(),
            Decimal::ZERO
        );
        assert_eq!(
            compute_max_principal(dec!(-500), dec!(12), 36).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_exact_forms_are_inverse() {
        let p = dec!(2_500_000);
        let emi = installment_exact(p, dec!(8.75), 240).unwrap();
        let back = max_principal_exact(emi, dec!(8.75), 240).unwrap();
        assert!((back - p).abs() < dec!(0.0001), "got {back}");
    }

    #[test]
    fn test_rounded_round_trip() {
        let p = dec!(1_000_000);
        let emi = compute_installment(p, dec!(13), 36).unwrap();
        let back = compute_max_principal(emi, dec!(13), 36).unwrap();
        assert!((back - p).abs() <= Decimal::ONE, "got {back}");
    }

    #[test]
    fn test_monthly_rate() {
        assert_eq!(monthly_rate(dec!(12)), dec!(0.01));
    }

    #[test]
    fn test_round_currency_midpoint() {
        assert_eq!(round_currency(dec!(10.005)), dec!(10.01));
        assert_eq!(round_currency(dec!(-10.005)), dec!(-10.01));
    }
}
