//! Contracts for the two optional external collaborators.
//!
//! Both are consulted through [`Consultation`], which makes "no input"
//! an explicit state the arbiter has to handle rather than an error path.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::Application;
use crate::types::{Money, Percent, Rate};
use crate::underwriting::PolicyCheck;

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationLabel {
    Approve,
    Review,
    Reject,
}

impl FromStr for RecommendationLabel {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "APPROVE" => Ok(Self::Approve),
            "REVIEW" => Ok(Self::Review),
            "REJECT" => Ok(Self::Reject),
            other => Err(ProviderError::Malformed(format!(
                "unrecognised recommendation label '{other}'"
            ))),
        }
    }
}

/// Model-based recommendation for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub label: RecommendationLabel,
    pub rationale: String,
    /// In [0, 1].
    pub confidence: Rate,
}

impl Recommendation {
    /// Reject payloads whose confidence falls outside [0, 1].
    pub fn validated(self) -> Result<Self, ProviderError> {
        if self.confidence < Decimal::ZERO || self.confidence > Decimal::ONE {
            return Err(ProviderError::Malformed(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        Ok(self)
    }
}

#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    async fn recommend(
        &self,
        application: &Application,
        checks: &[PolicyCheck],
        similar_cases: &[SimilarCase],
    ) -> Result<Recommendation, ProviderError>;

    fn name(&self) -> &str {
        "recommendation"
    }
}

// ---------------------------------------------------------------------------
// Similar cases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseOutcome {
    Approved,
    Rejected,
    Default,
    Performing,
}

/// Historical case surfaced as contextual evidence only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarCase {
    pub customer_id: String,
    /// In [0, 1].
    pub similarity: Rate,
    pub outcome: CaseOutcome,
    pub amount: Money,
    pub tenure_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<String>,
}

#[async_trait]
pub trait SimilarCaseProvider: Send + Sync {
    async fn find_similar(&self, application: &Application)
        -> Result<Vec<SimilarCase>, ProviderError>;

    fn name(&self) -> &str {
        "similar-cases"
    }
}

/// Reject case lists containing a similarity outside [0, 1].
pub fn validate_cases(cases: Vec<SimilarCase>) -> Result<Vec<SimilarCase>, ProviderError> {
    if let Some(bad) = cases
        .iter()
        .find(|c| c.similarity < Decimal::ZERO || c.similarity > Decimal::ONE)
    {
        return Err(ProviderError::Malformed(format!(
            "similarity {} outside [0, 1] for customer {}",
            bad.similarity, bad.customer_id
        )));
    }
    Ok(cases)
}

// ---------------------------------------------------------------------------
// Errors / consultation result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider timed out")]
    Timeout,
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Outcome of consulting an optional collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Consultation<T> {
    Received(T),
    /// Collaborator errored, timed out or returned malformed data.
    Failed { reason: String },
    NotConfigured,
    /// Not attempted because the application already failed a HARD check.
    Skipped,
}

impl<T> Consultation<T> {
    pub fn received(&self) -> Option<&T> {
        match self {
            Self::Received(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_received(&self) -> bool {
        matches!(self, Self::Received(_))
    }

    pub fn into_received(self) -> Option<T> {
        match self {
            Self::Received(value) => Some(value),
            _ => None,
        }
    }
}
