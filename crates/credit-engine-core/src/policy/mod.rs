//! Per-product underwriting policy and the catalog that binds it.

pub mod catalog;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ProductType;
use crate::types::{Money, Percent, Rate};
use crate::underwriting::grade::RiskGrade;
use crate::{CreditEngineError, CreditEngineResult};

pub use catalog::{PolicyCatalog, SharedCatalog};

// ---------------------------------------------------------------------------
// Policy record
// ---------------------------------------------------------------------------

/// Underwriting thresholds for one product type. Pure data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub product_type: ProductType,
    pub min_age: u32,
    pub max_age: u32,
    /// Floor on monthly plus additional income.
    pub min_income: Money,
    pub max_loan_amount: Money,
    /// Loan-to-value ceiling, secured products only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ltv: Option<Rate>,
    /// Fixed-obligation-to-income ceiling.
    pub max_foir: Rate,
    pub min_bureau_score: u32,
    pub min_tenure: u32,
    pub max_tenure: u32,
    /// Annual base rate in percent.
    pub base_rate: Percent,
    pub risk_premium: RiskPremiums,
    #[serde(default)]
    pub required_documents: Vec<String>,
}

/// Rate premium (annual percent) added to the base rate per risk grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskPremiums {
    #[serde(rename = "A")]
    pub a: Percent,
    #[serde(rename = "B")]
    pub b: Percent,
    #[serde(rename = "C")]
    pub c: Percent,
    #[serde(rename = "D")]
    pub d: Percent,
    #[serde(rename = "E")]
    pub e: Percent,
    #[serde(rename = "F")]
    pub f: Percent,
}

impl RiskPremiums {
    pub fn for_grade(&self, grade: RiskGrade) -> Percent {
        match grade {
            RiskGrade::A => self.a,
            RiskGrade::B => self.b,
            RiskGrade::C => self.c,
            RiskGrade::D => self.d,
            RiskGrade::E => self.e,
            RiskGrade::F => self.f,
        }
    }
}

impl Policy {
    /// Base rate plus the premium for `grade`.
    pub fn interest_rate_for(&self, grade: RiskGrade) -> Percent {
        self.base_rate + self.risk_premium.for_grade(grade)
    }

    /// Reference rate used to size the proposed installment in the FOIR
    /// check: base rate plus one point.
    pub fn reference_rate(&self) -> Percent {
        self.base_rate + Decimal::ONE
    }

    pub fn validate(&self) -> CreditEngineResult<()> {
        let field = |name: &str| format!("{}.{}", self.product_type, name);

        if self.min_age > self.max_age {
            return Err(CreditEngineError::InvalidInput {
                field: field("min_age"),
                reason: "Minimum age exceeds maximum age.".into(),
            });
        }
        if self.min_tenure > self.max_tenure {
            return Err(CreditEngineError::InvalidInput {
                field: field("min_tenure"),
                reason: "Minimum tenure exceeds maximum tenure.".into(),
            });
        }
        if self.max_loan_amount <= Decimal::ZERO {
            return Err(CreditEngineError::InvalidInput {
                field: field("max_loan_amount"),
                reason: "Loan ceiling must be positive.".into(),
            });
        }
        if self.max_foir <= Decimal::ZERO {
            return Err(CreditEngineError::InvalidInput {
                field: field("max_foir"),
                reason: "FOIR ceiling must be positive.".into(),
            });
        }
        if let Some(ltv) = self.max_ltv {
            if ltv <= Decimal::ZERO {
                return Err(CreditEngineError::InvalidInput {
                    field: field("max_ltv"),
                    reason: "LTV ceiling must be positive.".into(),
                });
            }
        }
        if self.base_rate < Decimal::ZERO {
            return Err(CreditEngineError::InvalidInput {
                field: field("base_rate"),
                reason: "Base rate cannot be negative.".into(),
            });
        }
        if RiskGrade::ALL
            .iter()
            .any(|g| self.risk_premium.for_grade(*g) < Decimal::ZERO)
        {
            return Err(CreditEngineError::InvalidInput {
                field: field("risk_premium"),
                reason: "Risk premiums cannot be negative.".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn home_loan() -> Policy {
        PolicyCatalog::reference()
            .get(&ProductType::HomeLoan)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_interest_rate_adds_grade_premium() {
        let p = home_loan();
        assert_eq!(p.interest_rate_for(RiskGrade::A), dec!(8.5));
        assert_eq!(p.interest_rate_for(RiskGrade::D), dec!(9.5));
        assert_eq!(p.interest_rate_for(RiskGrade::F), dec!(10.5));
    }

    #[test]
    fn test_reference_rate_is_base_plus_one() {
        assert_eq!(home_loan().reference_rate(), dec!(9.5));
    }

    #[test]
    fn test_inverted_age_bounds_rejected() {
        let mut p = home_loan();
        p.min_age = 70;
        let err = p.validate().unwrap_err();
        match err {
            CreditEngineError::InvalidInput { field, .. } => assert_eq!(field, "HOME_LOAN.min_age"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_premium_rejected() {
        let mut p = home_loan();
        p.risk_premium.e = dec!(-1);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_premiums_serialise_by_grade_letter() {
        let json = serde_json::to_value(home_loan().risk_premium).unwrap();
        assert!(json.get("A").is_some());
        assert!(json.get("F").is_some());
    }
}
