//! Arbitration and the terminal decision record.

pub mod arbiter;
pub mod brief;
pub mod engine;
pub mod providers;

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::{Application, ProductType};
use crate::types::{Money, Percent, Rate};
use crate::underwriting::{PolicyCheck, RiskAssessment};
use crate::CreditEngineError;

use arbiter::Arbitration;
use providers::SimilarCase;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
    ManualReview,
    ConditionalApproval,
}

impl std::fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::ManualReview => "MANUAL_REVIEW",
            Self::ConditionalApproval => "CONDITIONAL_APPROVAL",
        };
        write!(f, "{}", s)
    }
}

/// Who or what produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecidedBy {
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "RULES")]
    Rules,
    #[serde(rename = "MANUAL")]
    Manual,
}

/// Role that has to sign off on an escalated decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalRole {
    Manager,
    BranchManager,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovedTerms {
    pub amount: Money,
    pub tenure_months: u32,
    /// Annual percent.
    pub interest_rate: Percent,
    pub processing_fee: Money,
    pub installment: Money,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Terminal, immutable artifact of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub application_id: String,
    pub product_type: ProductType,
    pub outcome: DecisionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<ApprovedTerms>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejection_reasons: Vec<String>,
    pub risk: RiskAssessment,
    pub policy_checks: Vec<PolicyCheck>,
    pub decided_by: DecidedBy,
    pub confidence: Rate,
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_approval: Option<ApprovalRole>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub similar_cases: Vec<SimilarCase>,
    /// Required documents of the bound policy not yet supplied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_documents: Vec<String>,
    pub processing_time_us: u64,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub(crate) fn from_arbitration(
        application: &Application,
        arbitration: Arbitration,
        risk: RiskAssessment,
        policy_checks: Vec<PolicyCheck>,
        similar_cases: Vec<SimilarCase>,
        missing_documents: Vec<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            application_id: application.application_id.clone(),
            product_type: application.product_type.clone(),
            outcome: arbitration.outcome,
            terms: arbitration.terms,
            conditions: arbitration.conditions,
            rejection_reasons: arbitration.rejection_reasons,
            risk,
            policy_checks,
            decided_by: arbitration.decided_by,
            confidence: arbitration.confidence,
            rationale: arbitration.rationale,
            requires_approval: arbitration.requires_approval,
            similar_cases,
            missing_documents,
            processing_time_us: elapsed.as_micros() as u64,
            decided_at: Utc::now(),
        }
    }

    /// Conservative manual-review decision for a faulted pipeline.
    pub(crate) fn fallback(
        application: &Application,
        error: &CreditEngineError,
        elapsed: Duration,
    ) -> Self {
        Self {
            application_id: application.application_id.clone(),
            product_type: application.product_type.clone(),
            outcome: DecisionOutcome::ManualReview,
            terms: None,
            conditions: Vec::new(),
            rejection_reasons: Vec::new(),
            risk: RiskAssessment::safe_default(),
            policy_checks: Vec::new(),
            decided_by: DecidedBy::Rules,
            confidence: Decimal::ZERO,
            rationale: format!("System error - manual review required: {error}"),
            requires_approval: Some(ApprovalRole::BranchManager),
            similar_cases: Vec::new(),
            missing_documents: Vec::new(),
            processing_time_us: elapsed.as_micros() as u64,
            decided_at: Utc::now(),
        }
    }

    pub fn approved_amount(&self) -> Option<Money> {
        self.terms.as_ref().map(|t| t.amount)
    }

    /// One-line audit summary.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} {} {} (grade {}, score {})",
            self.application_id,
            self.product_type,
            self.outcome,
            self.risk.risk_grade,
            self.risk.risk_score.normalize()
        );
        if let Some(terms) = &self.terms {
            line.push_str(&format!(
                ": {} over {} months at {}%",
                terms.amount.normalize(),
                terms.tenure_months,
                terms.interest_rate.normalize()
            ));
        }
        if !self.rejection_reasons.is_empty() {
            line.push_str(&format!(": {}", self.rejection_reasons.join("; ")));
        }
        line
    }
}
