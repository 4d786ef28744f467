use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{Policy, RiskPremiums};
use crate::application::ProductType;
use crate::{CreditEngineError, CreditEngineResult};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable map from product type to its policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyCatalog {
    policies: BTreeMap<ProductType, Policy>,
}

impl PolicyCatalog {
    /// Build a catalog, keying each policy by its own product type.
    pub fn new(policies: impl IntoIterator<Item = Policy>) -> Self {
        Self {
            policies: policies
                .into_iter()
                .map(|p| (p.product_type.clone(), p))
                .collect(),
        }
    }

    /// Bound policy for a product. An unknown product is a configuration
    /// error, never a fallback to another policy.
    pub fn get(&self, product_type: &ProductType) -> CreditEngineResult<&Policy> {
        self.policies
            .get(product_type)
            .ok_or_else(|| CreditEngineError::PolicyNotFound {
                product_type: product_type.clone(),
            })
    }

    /// Copy of this catalog with one product's policy replaced or added.
    pub fn with_policy(&self, policy: Policy) -> Self {
        let mut policies = self.policies.clone();
        policies.insert(policy.product_type.clone(), policy);
        Self { policies }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProductType, &Policy)> {
        self.policies.iter()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Validate every policy and that each is stored under its own key.
    pub fn validate(&self) -> CreditEngineResult<()> {
        for (key, policy) in &self.policies {
            if key != &policy.product_type {
                return Err(CreditEngineError::InvalidInput {
                    field: key.to_string(),
                    reason: format!(
                        "Policy declares product type {} but is keyed as {}.",
                        policy.product_type, key
                    ),
                });
            }
            policy.validate()?;
        }
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> CreditEngineResult<Self> {
        let catalog: Self = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(raw: &str) -> CreditEngineResult<Self> {
        let catalog: Self = serde_yaml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reference configuration covering the common retail products.
    pub fn reference() -> Self {
        Self::new([
            Policy {
                product_type: ProductType::HomeLoan,
                min_age: 21,
                max_age: 65,
                min_income: dec!(25_000),
                max_loan_amount: dec!(50_000_000),
                max_ltv: Some(dec!(0.80)),
                max_foir: dec!(0.60),
                min_bureau_score: 650,
                min_tenure: 12,
                max_tenure: 360,
                base_rate: dec!(8.5),
                risk_premium: premiums([dec!(0), dec!(0.25), dec!(0.5), dec!(1), dec!(1.5), dec!(2)]),
                required_documents: docs(&["PAN", "AADHAAR", "SALARY_SLIP", "BANK_STATEMENT", "PROPERTY_DOCS"]),
            },
            Policy {
                product_type: ProductType::PersonalLoan,
                min_age: 21,
                max_age: 60,
                min_income: dec!(20_000),
                max_loan_amount: dec!(2_500_000),
                max_ltv: None,
                max_foir: dec!(0.50),
                min_bureau_score: 700,
                min_tenure: 6,
                max_tenure: 60,
                base_rate: dec!(12),
                risk_premium: premiums([dec!(0), dec!(0.5), dec!(1), dec!(2), dec!(3), dec!(4)]),
                required_documents: docs(&["PAN", "AADHAAR", "SALARY_SLIP", "BANK_STATEMENT"]),
            },
            Policy {
                product_type: ProductType::CarLoan,
                min_age: 21,
                max_age: 65,
                min_income: dec!(25_000),
                max_loan_amount: dec!(10_000_000),
                max_ltv: Some(dec!(0.85)),
                max_foir: dec!(0.55),
                min_bureau_score: 675,
                min_tenure: 12,
                max_tenure: 84,
                base_rate: dec!(9),
                risk_premium: premiums([dec!(0), dec!(0.5), dec!(1), dec!(1.5), dec!(2), dec!(2.5)]),
                required_documents: docs(&["PAN", "AADHAAR", "SALARY_SLIP", "BANK_STATEMENT"]),
            },
            Policy {
                product_type: ProductType::BusinessLoan,
                min_age: 25,
                max_age: 65,
                min_income: dec!(50_000),
                max_loan_amount: dec!(50_000_000),
                max_ltv: None,
                max_foir: dec!(0.65),
                min_bureau_score: 680,
                min_tenure: 12,
                max_tenure: 120,
                base_rate: dec!(14),
                risk_premium: premiums([dec!(0), dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]),
                required_documents: docs(&["PAN", "GSTIN", "ITR", "BANK_STATEMENT", "BUSINESS_PROOF"]),
            },
            Policy {
                product_type: ProductType::CreditCard,
                min_age: 21,
                max_age: 60,
                min_income: dec!(15_000),
                max_loan_amount: dec!(500_000),
                max_ltv: None,
                max_foir: dec!(0.40),
                min_bureau_score: 700,
                min_tenure: 0,
                max_tenure: 0,
                // Annualised revolving rate; flat across grades.
                base_rate: dec!(42),
                risk_premium: RiskPremiums::default(),
                required_documents: docs(&["PAN", "SALARY_SLIP"]),
            },
            Policy {
                product_type: ProductType::Overdraft,
                min_age: 21,
                max_age: 65,
                min_income: dec!(30_000),
                max_loan_amount: dec!(2_000_000),
                max_ltv: None,
                max_foir: dec!(0.50),
                min_bureau_score: 720,
                min_tenure: 0,
                max_tenure: 12,
                base_rate: dec!(15),
                risk_premium: premiums([dec!(0), dec!(0.5), dec!(1), dec!(1.5), dec!(2), dec!(3)]),
                required_documents: docs(&["PAN", "BANK_STATEMENT"]),
            },
        ])
    }
}

fn premiums([a, b, c, d, e, f]: [Decimal; 6]) -> RiskPremiums {
    RiskPremiums { a, b, c, d, e, f }
}

fn docs(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Shared handle
// ---------------------------------------------------------------------------

/// Hot-swappable catalog handle.
///
/// Updates replace the whole immutable map; readers take an `Arc`
/// snapshot so an in-flight evaluation never observes a half-applied
/// change.
#[derive(Debug, Clone)]
pub struct SharedCatalog {
    inner: Arc<RwLock<Arc<PolicyCatalog>>>,
}

impl SharedCatalog {
    pub fn new(catalog: PolicyCatalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    pub fn snapshot(&self) -> Arc<PolicyCatalog> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a whole new catalog.
    pub fn replace(&self, catalog: PolicyCatalog) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(catalog);
    }

    /// Replace a single product's policy.
    pub fn upsert(&self, policy: Policy) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let next = guard.with_policy(policy);
        *guard = Arc::new(next);
    }
}

impl Default for SharedCatalog {
    fn default() -> Self {
        Self::new(PolicyCatalog::reference())
    }
}

impl From<PolicyCatalog> for SharedCatalog {
    fn from(catalog: PolicyCatalog) -> Self {
        Self::new(catalog)
    }
}
