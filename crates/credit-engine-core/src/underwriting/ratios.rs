//! Standalone affordability ratios.
//!
//! Each returns `None` when the denominator is not positive instead of
//! dividing by zero.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::grade::RiskGrade;
use crate::types::{Money, Rate, Score};

/// Fixed-obligation-to-income ratio: (existing + proposed installments) / income.
pub fn obligation_to_income(
    monthly_income: Money,
    existing_emi: Money,
    proposed_emi: Money,
) -> Option<Rate> {
    if monthly_income <= Decimal::ZERO {
        return None;
    }
    existing_emi
        .checked_add(proposed_emi)?
        .checked_div(monthly_income)
}

/// Loan-to-value: loan amount / collateral value.
pub fn loan_to_value(loan_amount: Money, collateral_value: Money) -> Option<Rate> {
    if collateral_value <= Decimal::ZERO {
        return None;
    }
    loan_amount.checked_div(collateral_value)
}

/// Debt-to-income: total debt / annual income.
pub fn debt_to_income(monthly_income: Money, total_debt: Money) -> Option<Rate> {
    let annual = monthly_income.checked_mul(dec!(12))?;
    if annual <= Decimal::ZERO {
        return None;
    }
    total_debt.checked_div(annual)
}

/// Representative numeric score for a grade.
pub fn grade_to_score(grade: RiskGrade) -> Score {
    grade.representative_score()
}

/// Band lookup shared with the scorer.
pub fn score_to_grade(score: Score) -> RiskGrade {
    RiskGrade::from_score(score)
}
