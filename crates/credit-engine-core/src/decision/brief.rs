//! Plain-text case brief handed to recommendation providers.

use rust_decimal::prelude::*;

use super::providers::{CaseOutcome, SimilarCase};
use crate::application::Application;
use crate::underwriting::PolicyCheck;

const NOT_AVAILABLE: &str = "N/A";

/// Render the analyst brief for `application`.
///
/// Layout is stable so providers can template around it: applicant,
/// financial profile, request, check results, then similar cases.
/// Sections are separated by a blank line.
pub fn render(
    application: &Application,
    checks: &[PolicyCheck],
    similar_cases: &[SimilarCase],
) -> String {
    let sections = [
        vec![
            "LOAN APPLICATION ANALYSIS".to_string(),
            format!(
                "Application: {} (customer {})",
                application.application_id, application.customer_id
            ),
        ],
        applicant_section(application),
        financial_section(application),
        request_section(application),
        checks_section(checks),
        similar_cases_section(similar_cases),
    ];

    let mut out = sections
        .iter()
        .map(|lines| lines.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

fn applicant_section(application: &Application) -> Vec<String> {
    let applicant = &application.applicant;
    vec![
        "Applicant Profile:".to_string(),
        format!("- Age: {}", applicant.age),
        format!(
            "- Occupation: {} ({})",
            applicant.occupation.as_deref().unwrap_or(NOT_AVAILABLE),
            applicant.employment_type.label()
        ),
        format!("- Employer: {}", applicant.employer.as_deref().unwrap_or(NOT_AVAILABLE)),
        format!("- Years Employed: {}", optional(applicant.years_employed)),
        format!("- Residence: {:?}", applicant.residence_type),
    ]
}

fn financial_section(application: &Application) -> Vec<String> {
    let financial = &application.financial;
    let bureau = application
        .bureau_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Not available".to_string());
    vec![
        "Financial Profile:".to_string(),
        format!("- Monthly Income: {}", financial.monthly_income.normalize()),
        format!(
            "- Additional Income: {}",
            financial.additional_income.unwrap_or_default().normalize()
        ),
        format!("- Existing EMIs: {}", financial.existing_emi().normalize()),
        format!("- Bureau Score: {bureau}"),
    ]
}

fn request_section(application: &Application) -> Vec<String> {
    let request = &application.request;
    vec![
        "Loan Request:".to_string(),
        format!("- Product: {}", application.product_type),
        format!("- Amount: {}", request.amount.normalize()),
        format!("- Tenure: {} months", request.tenure_months),
        format!("- Purpose: {}", request.purpose.as_deref().unwrap_or("Not specified")),
    ]
}

fn checks_section(checks: &[PolicyCheck]) -> Vec<String> {
    let mut lines = vec!["Policy Check Results:".to_string()];
    lines.extend(checks.iter().map(|check| {
        format!(
            "- {}: {} ({} vs {})",
            check.rule,
            if check.passed { "PASS" } else { "FAIL" },
            display_or_na(check.observed.as_ref()),
            display_or_na(check.threshold.as_ref()),
        )
    }));
    lines
}

fn similar_cases_section(similar_cases: &[SimilarCase]) -> Vec<String> {
    let mut lines = vec!["Similar Historical Cases:".to_string()];
    if similar_cases.is_empty() {
        lines.push("No similar cases found".to_string());
    }
    lines.extend(similar_cases.iter().map(|case| {
        let similarity = case
            .similarity
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|pct| format!("{}%", pct.round()))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        format!(
            "- Similarity: {similarity}, Outcome: {}, Amount: {}",
            outcome_label(case.outcome),
            case.amount.normalize()
        )
    }));
    lines
}

fn display_or_na(value: Option<&impl std::fmt::Display>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn optional(value: Option<Decimal>) -> String {
    value
        .map(|v| v.normalize().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn outcome_label(outcome: CaseOutcome) -> &'static str {
    match outcome {
        CaseOutcome::Approved => "APPROVED",
        CaseOutcome::Rejected => "REJECTED",
        CaseOutcome::Default => "DEFAULT",
        CaseOutcome::Performing => "PERFORMING",
    }
}
