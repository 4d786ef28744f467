//! Deterministic underwriting: policy checks, risk grading and scoring.

pub mod checks;
pub mod grade;
pub mod ratios;
pub mod scoring;

pub use checks::{evaluate_policy_checks, CheckValue, PolicyCheck, PolicyRule, Severity};
pub use grade::RiskGrade;
pub use scoring::{assess_risk, score_breakdown, RiskAssessment, RiskScoreBreakdown};
