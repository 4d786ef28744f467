//! Credit application input model.
//!
//! An [`Application`] is immutable for the duration of one evaluation.
//! Optional enrichment fields are treated as zero or neutral when absent,
//! never as failures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};
use crate::{CreditEngineError, CreditEngineResult};

// ---------------------------------------------------------------------------
// Product type
// ---------------------------------------------------------------------------

/// Product key used to bind a policy from the catalog.
///
/// Serialises as its upper-snake-case key so it can be used directly as a
/// JSON / YAML map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductType {
    HomeLoan,
    PersonalLoan,
    CarLoan,
    BusinessLoan,
    CreditCard,
    Overdraft,
    Other(String),
}

impl ProductType {
    pub fn key(&self) -> &str {
        match self {
            Self::HomeLoan => "HOME_LOAN",
            Self::PersonalLoan => "PERSONAL_LOAN",
            Self::CarLoan => "CAR_LOAN",
            Self::BusinessLoan => "BUSINESS_LOAN",
            Self::CreditCard => "CREDIT_CARD",
            Self::Overdraft => "OVERDRAFT",
            Self::Other(key) => key,
        }
    }
}

impl From<String> for ProductType {
    fn from(value: String) -> Self {
        let key = value.trim().to_ascii_uppercase();
        match key.as_str() {
            "HOME_LOAN" => Self::HomeLoan,
            "PERSONAL_LOAN" => Self::PersonalLoan,
            "CAR_LOAN" => Self::CarLoan,
            "BUSINESS_LOAN" => Self::BusinessLoan,
            "CREDIT_CARD" => Self::CreditCard,
            "OVERDRAFT" => Self::Overdraft,
            _ => Self::Other(key),
        }
    }
}

impl From<&str> for ProductType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ProductType> for String {
    fn from(value: ProductType) -> Self {
        value.key().to_string()
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ---------------------------------------------------------------------------
// Applicant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    Salaried,
    SelfEmployed,
    Business,
    Retired,
    Other,
}

impl EmploymentType {
    /// Salaried, self-employed and business income count as stable.
    pub fn is_stable(self) -> bool {
        matches!(self, Self::Salaried | Self::SelfEmployed | Self::Business)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Salaried => "SALARIED",
            Self::SelfEmployed => "SELF_EMPLOYED",
            Self::Business => "BUSINESS",
            Self::Retired => "RETIRED",
            Self::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResidenceType {
    Owned,
    Rented,
    Family,
    CompanyProvided,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applicant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    pub employment_type: EmploymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer: Option<String>,
    /// Years with the current employer or in the current business.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_employed: Option<Decimal>,
    pub residence_type: ResidenceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_at_residence: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependents: Option<u32>,
}

// ---------------------------------------------------------------------------
// Financial profile / request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub monthly_income: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_income: Option<Money>,
    /// Installments already being serviced each month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_emi: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liabilities: Option<Money>,
    /// Collateral value for secured products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral_value: Option<Money>,
}

impl FinancialProfile {
    /// Monthly plus additional income.
    pub fn total_income(&self) -> CreditEngineResult<Money> {
        self.monthly_income
            .checked_add(self.additional_income.unwrap_or(Decimal::ZERO))
            .ok_or_else(|| CreditEngineError::overflow("total income"))
    }

    pub fn existing_emi(&self) -> Money {
        self.existing_emi.unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequest {
    pub amount: Money,
    /// Zero for revolving products.
    pub tenure_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub application_id: String,
    pub customer_id: String,
    pub product_type: ProductType,
    pub applicant: Applicant,
    pub financial: FinancialProfile,
    pub request: LoanRequest,
    /// External bureau score (300-900 scale).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bureau_score: Option<u32>,
    /// Internal model score in [0, 1], higher is safer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_risk_score: Option<Rate>,
    /// Relationship trust score in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<Rate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents_provided: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn total_income(&self) -> CreditEngineResult<Money> {
        self.financial.total_income()
    }

    /// Required documents of a policy that were not supplied.
    pub fn missing_documents(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|doc| {
                !self
                    .documents_provided
                    .iter()
                    .any(|provided| provided.eq_ignore_ascii_case(doc))
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_type_round_trips_through_key() {
        let p = ProductType::from("personal_loan");
        assert_eq!(p, ProductType::PersonalLoan);
        assert_eq!(String::from(p), "PERSONAL_LOAN");
    }

    #[test]
    fn test_unknown_product_type_is_preserved() {
        let p = ProductType::from("GOLD_LOAN");
        assert_eq!(p, ProductType::Other("GOLD_LOAN".into()));
        assert_eq!(p.to_string(), "GOLD_LOAN");
    }

    #[test]
    fn test_product_type_json_is_plain_string() {
        let json = serde_json::to_string(&ProductType::CreditCard).unwrap();
        assert_eq!(json, "\"CREDIT_CARD\"");
        let back: ProductType = serde_json::from_str("\"OVERDRAFT\"").unwrap();
        assert_eq!(back, ProductType::Overdraft);
    }

    #[test]
    fn test_total_income_overflow_is_an_error() {
        let financial = FinancialProfile {
            monthly_income: Decimal::MAX,
            additional_income: Some(Decimal::ONE),
            existing_emi: None,
            assets: None,
            liabilities: None,
            collateral_value: None,
        };
        assert!(matches!(
            financial.total_income(),
            Err(CreditEngineError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn test_stable_employment() {
        assert!(EmploymentType::Salaried.is_stable());
        assert!(EmploymentType::SelfEmployed.is_stable());
        assert!(EmploymentType::Business.is_stable());
        assert!(!EmploymentType::Retired.is_stable());
        assert!(!EmploymentType::Other.is_stable());
    }
}
