//! Policy check battery.
//!
//! Every applicable rule of the bound policy fires exactly once per
//! application. The tenure pair is skipped for revolving requests
//! (tenure of zero); nothing else is ever skipped silently.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ratios::obligation_to_income;
use crate::amortization::compute_installment;
use crate::application::Application;
use crate::policy::Policy;
use crate::types::Rate;
use crate::CreditEngineResult;

/// Minimum years with the current employer for the tenure-of-employment check.
const MIN_YEARS_EMPLOYED: Decimal = dec!(1);

// ---------------------------------------------------------------------------
// Rule taxonomy
// ---------------------------------------------------------------------------

/// Disqualifying power of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Any failure forces rejection.
    Hard,
    /// Failure degrades the risk score only.
    Soft,
}

/// Rule identifiers. The serialised code carries the severity prefix, and
/// both are derived from the same variant so they cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyRule {
    #[serde(rename = "HARD_AGE_MIN")]
    AgeMin,
    #[serde(rename = "HARD_AGE_MAX")]
    AgeMax,
    #[serde(rename = "HARD_MIN_INCOME")]
    MinIncome,
    #[serde(rename = "HARD_MAX_AMOUNT")]
    MaxAmount,
    #[serde(rename = "HARD_TENURE_MIN")]
    TenureMin,
    #[serde(rename = "HARD_TENURE_MAX")]
    TenureMax,
    #[serde(rename = "SOFT_BUREAU_SCORE")]
    BureauScore,
    #[serde(rename = "SOFT_FOIR")]
    Foir,
    #[serde(rename = "SOFT_EMPLOYMENT")]
    Employment,
    #[serde(rename = "SOFT_YEARS_EMPLOYED")]
    YearsEmployed,
}

impl PolicyRule {
    pub const ALL: [PolicyRule; 10] = [
        Self::AgeMin,
        Self::AgeMax,
        Self::MinIncome,
        Self::MaxAmount,
        Self::TenureMin,
        Self::TenureMax,
        Self::BureauScore,
        Self::Foir,
        Self::Employment,
        Self::YearsEmployed,
    ];

    pub fn severity(self) -> Severity {
        match self {
            Self::AgeMin
            | Self::AgeMax
            | Self::MinIncome
            | Self::MaxAmount
            | Self::TenureMin
            | Self::TenureMax => Severity::Hard,
            Self::BureauScore | Self::Foir | Self::Employment | Self::YearsEmployed => {
                Severity::Soft
            }
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::AgeMin => "HARD_AGE_MIN",
            Self::AgeMax => "HARD_AGE_MAX",
            Self::MinIncome => "HARD_MIN_INCOME",
            Self::MaxAmount => "HARD_MAX_AMOUNT",
            Self::TenureMin => "HARD_TENURE_MIN",
            Self::TenureMax => "HARD_TENURE_MAX",
            Self::BureauScore => "SOFT_BUREAU_SCORE",
            Self::Foir => "SOFT_FOIR",
            Self::Employment => "SOFT_EMPLOYMENT",
            Self::YearsEmployed => "SOFT_YEARS_EMPLOYED",
        }
    }
}

impl std::fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Check record
// ---------------------------------------------------------------------------

/// Observed value or threshold of a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckValue {
    Number(Decimal),
    Text(String),
}

impl std::fmt::Display for CheckValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n.normalize()),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<Decimal> for CheckValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for CheckValue {
    fn from(value: u32) -> Self {
        Self::Number(Decimal::from(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyCheck {
    pub rule: PolicyRule,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<CheckValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<CheckValue>,
    pub message: String,
}

impl PolicyCheck {
    fn new(
        rule: PolicyRule,
        passed: bool,
        observed: Option<CheckValue>,
        threshold: Option<CheckValue>,
        message: String,
    ) -> Self {
        Self {
            rule,
            passed,
            observed,
            threshold,
            message,
        }
    }

    pub fn severity(&self) -> Severity {
        self.rule.severity()
    }

    pub fn is_hard_failure(&self) -> bool {
        !self.passed && self.severity() == Severity::Hard
    }

    pub fn is_soft_failure(&self) -> bool {
        !self.passed && self.severity() == Severity::Soft
    }

    pub fn observed_number(&self) -> Option<Decimal> {
        match self.observed {
            Some(CheckValue::Number(n)) => Some(n),
            _ => None,
        }
    }
}

pub fn has_hard_failure(checks: &[PolicyCheck]) -> bool {
    checks.iter().any(PolicyCheck::is_hard_failure)
}

pub fn hard_failures(checks: &[PolicyCheck]) -> impl Iterator<Item = &PolicyCheck> {
    checks.iter().filter(|c| c.is_hard_failure())
}

pub fn soft_failure_count(checks: &[PolicyCheck]) -> usize {
    checks.iter().filter(|c| c.is_soft_failure()).count()
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Run the full check battery for one application against its policy.
pub fn evaluate_policy_checks(
    application: &Application,
    policy: &Policy,
) -> CreditEngineResult<Vec<PolicyCheck>> {
    let applicant = &application.applicant;
    let financial = &application.financial;
    let request = &application.request;
    let total_income = financial.total_income()?;

    let mut checks = Vec::with_capacity(PolicyRule::ALL.len());

    // -- Age ------------------------------------------------------------------
    checks.push(PolicyCheck::new(
        PolicyRule::AgeMin,
        applicant.age >= policy.min_age,
        Some(applicant.age.into()),
        Some(policy.min_age.into()),
        format!("Minimum age requirement: {}", policy.min_age),
    ));
    checks.push(PolicyCheck::new(
        PolicyRule::AgeMax,
        applicant.age <= policy.max_age,
        Some(applicant.age.into()),
        Some(policy.max_age.into()),
        format!("Maximum age at maturity: {}", policy.max_age),
    ));

    // -- Income and amount ----------------------------------------------------
    checks.push(PolicyCheck::new(
        PolicyRule::MinIncome,
        total_income >= policy.min_income,
        Some(total_income.into()),
        Some(policy.min_income.into()),
        format!("Minimum income requirement: {}", policy.min_income.normalize()),
    ));
    checks.push(PolicyCheck::new(
        PolicyRule::MaxAmount,
        request.amount <= policy.max_loan_amount,
        Some(request.amount.into()),
        Some(policy.max_loan_amount.into()),
        format!("Maximum loan amount: {}", policy.max_loan_amount.normalize()),
    ));

    // -- Bureau ---------------------------------------------------------------
    let bureau = application.bureau_score.unwrap_or(0);
    checks.push(PolicyCheck::new(
        PolicyRule::BureauScore,
        bureau >= policy.min_bureau_score,
        Some(bureau.into()),
        Some(policy.min_bureau_score.into()),
        format!("Minimum bureau score: {}", policy.min_bureau_score),
    ));

    // -- FOIR -----------------------------------------------------------------
    // Proposed installment is sized at the reference rate (base + 1pt).
    // An installment that cannot be computed leaves FOIR undefined, like
    // a zero income does.
    let foir = compute_installment(request.amount, policy.reference_rate(), request.tenure_months)
        .ok()
        .and_then(|proposed_emi| {
            obligation_to_income(total_income, financial.existing_emi(), proposed_emi)
        });
    checks.push(PolicyCheck::new(
        PolicyRule::Foir,
        foir.is_some_and(|f| f <= policy.max_foir),
        foir.map(|f| round_ratio(f).into()),
        Some(policy.max_foir.into()),
        format!(
            "FOIR limit: {}%",
            (policy.max_foir * dec!(100)).normalize()
        ),
    ));

    // -- Tenure (amortising requests only) ------------------------------------
    if request.tenure_months > 0 {
        checks.push(PolicyCheck::new(
            PolicyRule::TenureMin,
            request.tenure_months >= policy.min_tenure,
            Some(request.tenure_months.into()),
            Some(policy.min_tenure.into()),
            format!("Minimum tenure: {} months", policy.min_tenure),
        ));
        checks.push(PolicyCheck::new(
            PolicyRule::TenureMax,
            request.tenure_months <= policy.max_tenure,
            Some(request.tenure_months.into()),
            Some(policy.max_tenure.into()),
            format!("Maximum tenure: {} months", policy.max_tenure),
        ));
    }

    // -- Employment -----------------------------------------------------------
    checks.push(PolicyCheck::new(
        PolicyRule::Employment,
        applicant.employment_type.is_stable(),
        Some(CheckValue::Text(applicant.employment_type.label().to_string())),
        None,
        "Stable employment required".to_string(),
    ));

    if let Some(years) = applicant.years_employed {
        checks.push(PolicyCheck::new(
            PolicyRule::YearsEmployed,
            years >= MIN_YEARS_EMPLOYED,
            Some(years.into()),
            Some(MIN_YEARS_EMPLOYED.into()),
            "Minimum 1 year employment required".to_string(),
        ));
    }

    debug!(
        application_id = %application.application_id,
        product = %policy.product_type,
        checks = checks.len(),
        hard_failures = hard_failures(&checks).count(),
        soft_failures = soft_failure_count(&checks),
        "policy checks evaluated"
    );

    Ok(checks)
}

/// Ratios are reported to two decimal places.
fn round_ratio(value: Rate) -> Rate {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
