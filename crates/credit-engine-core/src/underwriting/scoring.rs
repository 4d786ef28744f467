//! Weighted-penalty risk scorer.
//!
//! Starts from 100 and subtracts additive penalty terms:
//!
//! 1. **Bureau band** -- 0 / 5 / 10 / 20 / 30 / 40 by score band; a missing
//!    bureau score is scored as 650.
//! 2. **FOIR** -- read from the `SOFT_FOIR` check: >0.60 → 20, >0.50 → 10,
//!    >0.40 → 5.
//! 3. **Employment stability** -- salaried 0, business 5, self-employed 8,
//!    other 15, plus 5 when under two years employed.
//! 4. **Internal score** -- `(1 - internal) * 15` when present.
//! 5. **Trust score** -- `(trust - 0.5) * 10` credit when present.
//! 6. **Soft failures** -- 5 per failed SOFT check.
//!
//! The result is clamped to [0, 100], graded by fixed bands and mapped to a
//! default probability by a logistic curve centred at 50.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::checks::{soft_failure_count, PolicyCheck, PolicyRule};
use super::grade::RiskGrade;
use crate::application::{Application, EmploymentType};
use crate::types::{Rate, Score};
use crate::{CreditEngineError, CreditEngineResult};

const MAX_SCORE: Decimal = dec!(100);
const MISSING_BUREAU_SCORE: u32 = 650;
const LOGISTIC_CENTRE: Decimal = dec!(50);
const LOGISTIC_SCALE: Decimal = dec!(15);
/// Penalty when the FOIR could not be computed (no positive income).
const UNDEFINED_FOIR_PENALTY: Decimal = dec!(20);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Normalised score, its grade and the implied default probability.
///
/// Constructed only through [`RiskAssessment::from_score`], so the grade
/// always agrees with the band table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: Score,
    pub risk_grade: RiskGrade,
    pub default_probability: Rate,
}

impl RiskAssessment {
    /// Clamp, grade and map a raw score.
    pub fn from_score(raw: Score) -> Self {
        let risk_score = raw.max(Decimal::ZERO).min(MAX_SCORE);
        Self {
            risk_score,
            risk_grade: RiskGrade::from_score(risk_score),
            default_probability: default_probability(risk_score),
        }
    }

    /// Conservative assessment used when the pipeline faults: score 50,
    /// grade D.
    pub fn safe_default() -> Self {
        Self::from_score(LOGISTIC_CENTRE)
    }
}

/// Individual penalty terms, kept for explainability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScoreBreakdown {
    pub bureau_penalty: Decimal,
    pub foir_penalty: Decimal,
    pub employment_penalty: Decimal,
    pub employment_tenure_penalty: Decimal,
    /// Subtracted.
    pub internal_score_penalty: Decimal,
    /// Added; negative when trust is below 0.5.
    pub trust_adjustment: Decimal,
    pub soft_failure_penalty: Decimal,
}

impl RiskScoreBreakdown {
    /// Unclamped score.
    pub fn raw_score(&self) -> CreditEngineResult<Score> {
        [
            self.bureau_penalty,
            self.foir_penalty,
            self.employment_penalty,
            self.employment_tenure_penalty,
            self.internal_score_penalty,
            self.soft_failure_penalty,
        ]
        .iter()
        .try_fold(MAX_SCORE, |score, penalty| score.checked_sub(*penalty))
        .and_then(|score| score.checked_add(self.trust_adjustment))
        .ok_or_else(|| CreditEngineError::overflow("raw risk score"))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Score an application given its policy checks.
pub fn assess_risk(
    application: &Application,
    checks: &[PolicyCheck],
) -> CreditEngineResult<RiskAssessment> {
    let raw = score_breakdown(application, checks)?.raw_score()?;
    Ok(RiskAssessment::from_score(raw))
}

/// Compute each penalty term. Enrichment scores are not range-checked, so
/// out-of-range values that overflow are reported instead of scored.
pub fn score_breakdown(
    application: &Application,
    checks: &[PolicyCheck],
) -> CreditEngineResult<RiskScoreBreakdown> {
    let applicant = &application.applicant;

    let bureau_penalty = bureau_penalty(application.bureau_score.unwrap_or(MISSING_BUREAU_SCORE));

    let foir_penalty = match checks.iter().find(|c| c.rule == PolicyRule::Foir) {
        Some(check) => match check.observed_number() {
            Some(foir) => foir_penalty(foir),
            None => UNDEFINED_FOIR_PENALTY,
        },
        None => Decimal::ZERO,
    };

    let employment_penalty = match applicant.employment_type {
        EmploymentType::Salaried => Decimal::ZERO,
        EmploymentType::Business => dec!(5),
        EmploymentType::SelfEmployed => dec!(8),
        EmploymentType::Retired | EmploymentType::Other => dec!(15),
    };

    let employment_tenure_penalty = if applicant.years_employed.unwrap_or(Decimal::ZERO) < dec!(2) {
        dec!(5)
    } else {
        Decimal::ZERO
    };

    let internal_score_penalty = match application.internal_risk_score {
        Some(internal) => Decimal::ONE
            .checked_sub(internal)
            .and_then(|gap| gap.checked_mul(dec!(15)))
            .ok_or_else(|| CreditEngineError::overflow("internal score penalty"))?,
        None => Decimal::ZERO,
    };

    let trust_adjustment = match application.trust_score {
        Some(trust) => trust
            .checked_sub(dec!(0.5))
            .and_then(|delta| delta.checked_mul(dec!(10)))
            .ok_or_else(|| CreditEngineError::overflow("trust adjustment"))?,
        None => Decimal::ZERO,
    };

    let soft_failure_penalty = Decimal::from(soft_failure_count(checks)) * dec!(5);

    Ok(RiskScoreBreakdown {
        bureau_penalty,
        foir_penalty,
        employment_penalty,
        employment_tenure_penalty,
        internal_score_penalty,
        trust_adjustment,
        soft_failure_penalty,
    })
}

/// Logistic default probability, decreasing in score:
/// `1 / (1 + e^((score - 50) / 15))`.
pub fn default_probability(score: Score) -> Rate {
    let clamped = score.max(Decimal::ZERO).min(MAX_SCORE);
    let exponent = (clamped - LOGISTIC_CENTRE) / LOGISTIC_SCALE;
    let p = Decimal::ONE / (Decimal::ONE + exponent.exp());
    p.round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn bureau_penalty(bureau: u32) -> Decimal {
    match bureau {
        800.. => Decimal::ZERO,
        750..=799 => dec!(5),
        700..=749 => dec!(10),
        650..=699 => dec!(20),
        600..=649 => dec!(30),
        _ => dec!(40),
    }
}

fn foir_penalty(foir: Rate) -> Decimal {
    if foir > dec!(0.60) {
        dec!(20)
    } else if foir > dec!(0.50) {
        dec!(10)
    } else if foir > dec!(0.40) {
        dec!(5)
    } else {
        Decimal::ZERO
    }
}
