//! Resolves checks, risk and the optional recommendation into a verdict.
//!
//! ```text
//! EVALUATING ─┬─ any HARD failure ──────────────────────────► REJECTED
//!             ├─ grade A/B ─┬─ recommendation REVIEW ───────► MANUAL_REVIEW (manager)
//!             │             ├─ no recommendation, flag off ─► MANUAL_REVIEW (manager)
//!             │             └─ otherwise ───────────────────► APPROVED
//!             ├─ grade C/D ─┬─ APPROVE above threshold ─────► CONDITIONAL_APPROVAL
//!             │             └─ otherwise ───────────────────► MANUAL_REVIEW (branch manager)
//!             └─ grade E/F ─────────────────────────────────► REJECTED
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::providers::{Consultation, Recommendation, RecommendationLabel};
use super::{ApprovalRole, ApprovedTerms, DecidedBy, DecisionOutcome};
use crate::amortization::{compute_installment, compute_max_principal, round_currency};
use crate::application::Application;
use crate::policy::Policy;
use crate::types::{Money, Percent, Rate};
use crate::underwriting::checks::hard_failures;
use crate::underwriting::{PolicyCheck, RiskAssessment, RiskGrade};
use crate::{CreditEngineError, CreditEngineResult};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Tunable arbitration constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrationOptions {
    /// Approve grade A/B applications when no recommendation is available.
    /// When false they are escalated to a manager instead.
    pub approve_prime_without_recommendation: bool,
    /// Grade C/D need an APPROVE recommendation strictly above this.
    pub conditional_min_confidence: Rate,
    /// Share of the affordable amount granted on conditional approval.
    pub conditional_amount_factor: Rate,
    pub processing_fee_rate: Rate,
    pub standard_conditions: Vec<String>,
}

impl Default for ArbitrationOptions {
    fn default() -> Self {
        Self {
            approve_prime_without_recommendation: true,
            conditional_min_confidence: dec!(0.8),
            conditional_amount_factor: dec!(0.8),
            processing_fee_rate: dec!(0.01),
            standard_conditions: vec![
                "Additional income proof required".to_string(),
                "Guarantor required for higher amounts".to_string(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

pub struct ArbitrationInput<'a> {
    pub application: &'a Application,
    pub policy: &'a Policy,
    pub checks: &'a [PolicyCheck],
    pub risk: &'a RiskAssessment,
    pub recommendation: &'a Consultation<Recommendation>,
}

/// Verdict and terms, before timing and audit context are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Arbitration {
    pub outcome: DecisionOutcome,
    pub terms: Option<ApprovedTerms>,
    pub conditions: Vec<String>,
    pub rejection_reasons: Vec<String>,
    pub decided_by: DecidedBy,
    pub confidence: Rate,
    pub rationale: String,
    pub requires_approval: Option<ApprovalRole>,
}

/// Affordability sizing behind the granted amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affordability {
    pub interest_rate: Percent,
    pub max_installment: Money,
    pub max_amount_by_affordability: Money,
    pub approved_amount: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Size the grantable amount: the request, capped by what the FOIR
/// headroom can service at the graded rate, capped by the policy ceiling.
pub fn size_affordability(
    application: &Application,
    policy: &Policy,
    grade: RiskGrade,
) -> CreditEngineResult<Affordability> {
    let interest_rate = policy.interest_rate_for(grade);
    let max_installment = application
        .total_income()?
        .checked_mul(policy.max_foir)
        .and_then(|headroom| headroom.checked_sub(application.financial.existing_emi()))
        .ok_or_else(|| CreditEngineError::overflow("installment headroom"))?;
    let max_amount_by_affordability = compute_max_principal(
        max_installment,
        interest_rate,
        application.request.tenure_months,
    )?;
    let approved_amount = application
        .request
        .amount
        .min(max_amount_by_affordability)
        .min(policy.max_loan_amount);

    Ok(Affordability {
        interest_rate,
        max_installment,
        max_amount_by_affordability,
        approved_amount,
    })
}

pub fn arbitrate(
    input: &ArbitrationInput<'_>,
    options: &ArbitrationOptions,
) -> CreditEngineResult<Arbitration> {
    let failures: Vec<&PolicyCheck> = hard_failures(input.checks).collect();
    if !failures.is_empty() {
        return Ok(Arbitration {
            outcome: DecisionOutcome::Rejected,
            terms: None,
            conditions: Vec::new(),
            rejection_reasons: failures.iter().map(|c| c.message.clone()).collect(),
            decided_by: DecidedBy::Rules,
            confidence: Decimal::ZERO,
            rationale: "Rejected due to policy violations".to_string(),
            requires_approval: None,
        });
    }

    let grade = input.risk.risk_grade;
    let sizing = size_affordability(input.application, input.policy, grade)?;
    let recommendation = input.recommendation.received();

    let (outcome, requires_approval) = if grade.is_prime() {
        match recommendation {
            Some(rec) if rec.label == RecommendationLabel::Review => {
                (DecisionOutcome::ManualReview, Some(ApprovalRole::Manager))
            }
            Some(_) => (DecisionOutcome::Approved, None),
            None if options.approve_prime_without_recommendation => {
                (DecisionOutcome::Approved, None)
            }
            None => (DecisionOutcome::ManualReview, Some(ApprovalRole::Manager)),
        }
    } else if grade.is_near_prime() {
        match recommendation {
            Some(rec)
                if rec.label == RecommendationLabel::Approve
                    && rec.confidence > options.conditional_min_confidence =>
            {
                (DecisionOutcome::ConditionalApproval, None)
            }
            _ => (DecisionOutcome::ManualReview, Some(ApprovalRole::BranchManager)),
        }
    } else {
        (DecisionOutcome::Rejected, None)
    };

    let granted = if outcome == DecisionOutcome::ConditionalApproval {
        sizing
            .approved_amount
            .checked_mul(options.conditional_amount_factor)
            .map(round_currency)
            .ok_or_else(|| CreditEngineError::overflow("conditional amount"))?
    } else {
        sizing.approved_amount
    };

    let terms = if outcome == DecisionOutcome::Rejected {
        None
    } else {
        let tenure = input.application.request.tenure_months;
        let processing_fee = granted
            .checked_mul(options.processing_fee_rate)
            .map(round_currency)
            .ok_or_else(|| CreditEngineError::overflow("processing fee"))?;
        Some(ApprovedTerms {
            amount: granted,
            tenure_months: tenure,
            interest_rate: sizing.interest_rate,
            processing_fee,
            installment: compute_installment(granted, sizing.interest_rate, tenure)?,
        })
    };

    let conditions = if outcome == DecisionOutcome::ConditionalApproval {
        options.standard_conditions.clone()
    } else {
        Vec::new()
    };

    let rejection_reasons = if outcome == DecisionOutcome::Rejected {
        let mut reasons = vec!["Risk grade too low".to_string()];
        if let Some(rec) = recommendation {
            if !rec.rationale.is_empty() {
                reasons.push(rec.rationale.clone());
            }
        }
        reasons
    } else {
        Vec::new()
    };

    let (decided_by, confidence, rationale) = match recommendation {
        Some(rec) => (DecidedBy::Ai, rec.confidence, rec.rationale.clone()),
        None => (
            DecidedBy::Rules,
            Decimal::ZERO,
            rules_rationale(outcome, grade),
        ),
    };

    Ok(Arbitration {
        outcome,
        terms,
        conditions,
        rejection_reasons,
        decided_by,
        confidence,
        rationale,
        requires_approval,
    })
}

fn rules_rationale(outcome: DecisionOutcome, grade: RiskGrade) -> String {
    match outcome {
        DecisionOutcome::Approved => format!("Risk grade {grade} within policy; approved on rules"),
        DecisionOutcome::ConditionalApproval => {
            format!("Risk grade {grade} conditionally approved on rules")
        }
        DecisionOutcome::ManualReview => {
            format!("Risk grade {grade} requires review; no qualifying recommendation")
        }
        DecisionOutcome::Rejected => format!("Risk grade {grade} below approval threshold"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        Applicant, EmploymentType, FinancialProfile, LoanRequest, ProductType, ResidenceType,
    };
    use crate::policy::PolicyCatalog;
    use crate::underwriting::evaluate_policy_checks;
    use pretty_assertions::assert_eq;

    fn application() -> Application {
        Application {
            application_id: "APP-42".into(),
            customer_id: "CUST-42".into(),
            product_type: ProductType::PersonalLoan,
            applicant: Applicant {
                name: Some("Test Applicant".into()),
                age: 32,
                occupation: Some("Engineer".into()),
                employment_type: EmploymentType::Salaried,
                employer: None,
                years_employed: Some(dec!(5)),
                residence_type: ResidenceType::Owned,
                years_at_residence: None,
                dependents: None,
            },
            financial: FinancialProfile {
                monthly_income: dec!(100_000),
                additional_income: None,
                existing_emi: None,
                assets: None,
                liabilities: None,
                collateral_value: None,
            },
            request: LoanRequest {
                amount: dec!(200_000),
                tenure_months: 36,
                purpose: None,
            },
            bureau_score: Some(810),
            internal_risk_score: None,
            trust_score: None,
            documents_provided: Vec::new(),
            channel: None,
            branch_code: None,
            submitted_at: None,
        }
    }

    fn policy() -> Policy {
        PolicyCatalog::reference()
            .get(&ProductType::PersonalLoan)
            .unwrap()
            .clone()
    }

    fn rec(label: RecommendationLabel, confidence: Decimal) -> Consultation<Recommendation> {
        Consultation::Received(Recommendation {
            label,
            rationale: "model rationale".into(),
            confidence,
        })
    }

    fn run(
        app: &Application,
        risk: RiskAssessment,
        recommendation: Consultation<Recommendation>,
        options: &ArbitrationOptions,
    ) -> Arbitration {
        let policy = policy();
        let checks = evaluate_policy_checks(app, &policy).unwrap();
        let input = ArbitrationInput {
            application: app,
            policy: &policy,
            checks: &checks,
            risk: &risk,
            recommendation: &recommendation,
        };
        arbitrate(&input, options).unwrap()
    }

    fn graded(grade: RiskGrade) -> RiskAssessment {
        RiskAssessment::from_score(grade.representative_score())
    }

    #[test]
    fn test_prime_without_recommendation_approves_on_rules() {
        let app = application();
        let out = run(&app, graded(RiskGrade::A), Consultation::NotConfigured, &ArbitrationOptions::default());
        assert_eq!(out.outcome, DecisionOutcome::Approved);
        assert_eq!(out.decided_by, DecidedBy::Rules);
        assert_eq!(out.confidence, Decimal::ZERO);
        let terms = out.terms.unwrap();
        assert_eq!(terms.amount, dec!(200_000));
        assert_eq!(terms.interest_rate, dec!(12));
        assert_eq!(terms.processing_fee, dec!(2000));
        assert_eq!(terms.installment, compute_installment(dec!(200_000), dec!(12), 36).unwrap());
    }

    #[test]
    fn test_prime_without_recommendation_flag_off_escalates() {
        let app = application();
        let options = ArbitrationOptions {
            approve_prime_without_recommendation: false,
            ..ArbitrationOptions::default()
        };
        let out = run(&app, graded(RiskGrade::B), Consultation::Failed { reason: "down".into() }, &options);
        assert_eq!(out.outcome, DecisionOutcome::ManualReview);
        assert_eq!(out.requires_approval, Some(ApprovalRole::Manager));
        assert_eq!(out.decided_by, DecidedBy::Rules);
    }

    #[test]
    fn test_prime_review_recommendation_escalates_to_manager() {
        let app = application();
        let out = run(&app, graded(RiskGrade::A), rec(RecommendationLabel::Review, dec!(0.6)), &ArbitrationOptions::default());
        assert_eq!(out.outcome, DecisionOutcome::ManualReview);
        assert_eq!(out.requires_approval, Some(ApprovalRole::Manager));
        assert_eq!(out.decided_by, DecidedBy::Ai);
        assert_eq!(out.confidence, dec!(0.6));
    }

    #[test]
    fn test_prime_low_confidence_approve_still_approves() {
        let app = application();
        let out = run(&app, graded(RiskGrade::B), rec(RecommendationLabel::Approve, dec!(0.5)), &ArbitrationOptions::default());
        assert_eq!(out.outcome, DecisionOutcome::Approved);
        assert_eq!(out.decided_by, DecidedBy::Ai);
        // Grade B premium on personal loans is 0.5pt
        assert_eq!(out.terms.unwrap().interest_rate, dec!(12.5));
    }

    #[test]
    fn test_near_prime_confident_approve_is_conditional() {
        let app = application();
        let out = run(&app, graded(RiskGrade::C), rec(RecommendationLabel::Approve, dec!(0.85)), &ArbitrationOptions::default());
        assert_eq!(out.outcome, DecisionOutcome::ConditionalApproval);
        assert_eq!(out.conditions.len(), 2);
        assert_eq!(out.terms.unwrap().amount, dec!(160_000));
    }

    #[test]
    fn test_near_prime_threshold_is_strict() {
        let app = application();
        let out = run(&app, graded(RiskGrade::D), rec(RecommendationLabel::Approve, dec!(0.8)), &ArbitrationOptions::default());
        assert_eq!(out.outcome, DecisionOutcome::ManualReview);
        assert_eq!(out.requires_approval, Some(ApprovalRole::BranchManager));
    }

    #[test]
    fn test_near_prime_without_recommendation_goes_to_branch_manager() {
        let app = application();
        let out = run(&app, graded(RiskGrade::C), Consultation::NotConfigured, &ArbitrationOptions::default());
        assert_eq!(out.outcome, DecisionOutcome::ManualReview);
        assert_eq!(out.requires_approval, Some(ApprovalRole::BranchManager));
        assert!(out.terms.is_some());
    }

    #[test]
    fn test_subprime_always_rejected() {
        let app = application();
        let out = run(&app, graded(RiskGrade::E), rec(RecommendationLabel::Approve, dec!(0.99)), &ArbitrationOptions::default());
        assert_eq!(out.outcome, DecisionOutcome::Rejected);
        assert!(out.terms.is_none());
        assert_eq!(
            out.rejection_reasons,
            vec!["Risk grade too low".to_string(), "model rationale".to_string()]
        );
    }

    #[test]
    fn test_hard_failure_dominates_recommendation() {
        let mut app = application();
        app.applicant.age = 18;
        let out = run(&app, graded(RiskGrade::A), rec(RecommendationLabel::Approve, dec!(1)), &ArbitrationOptions::default());
        assert_eq!(out.outcome, DecisionOutcome::Rejected);
        assert_eq!(out.decided_by, DecidedBy::Rules);
        assert_eq!(out.rationale, "Rejected due to policy violations");
        assert_eq!(out.rejection_reasons, vec!["Minimum age requirement: 21".to_string()]);
    }

    #[test]
    fn test_affordability_caps_amount() {
        let mut app = application();
        app.financial.monthly_income = dec!(30_000);
        app.financial.existing_emi = Some(dec!(5_000));
        app.request.amount = dec!(2_000_000);
        let sizing = size_affordability(&app, &policy(), RiskGrade::A).unwrap();

        // 30k * 0.5 - 5k = 10k of installment headroom
        assert_eq!(sizing.max_installment, dec!(10_000));
        let expected = compute_max_principal(dec!(10_000), dec!(12), 36).unwrap();
        assert_eq!(sizing.max_amount_by_affordability, expected);
        assert_eq!(sizing.approved_amount, expected);
        assert!(sizing.approved_amount < dec!(2_000_000));
    }

    #[test]
    fn test_unrepresentable_headroom_is_an_error() {
        let mut app = application();
        app.financial.monthly_income = Decimal::MAX;
        app.financial.existing_emi = Some(Decimal::MIN);
        assert!(matches!(
            size_affordability(&app, &policy(), RiskGrade::A),
            Err(CreditEngineError::ArithmeticOverflow { .. })
        ));
    }

    #[test]
    fn test_policy_ceiling_caps_amount() {
        let mut app = application();
        app.financial.monthly_income = dec!(10_000_000);
        app.request.amount = dec!(3_000_000);
        let sizing = size_affordability(&app, &policy(), RiskGrade::A).unwrap();
        assert_eq!(sizing.approved_amount, dec!(2_500_000));
    }
}
