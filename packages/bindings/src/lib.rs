use std::time::Instant;

use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use credit_engine_core::amortization;
use credit_engine_core::application::Application;
use credit_engine_core::decision::arbiter::ArbitrationOptions;
use credit_engine_core::policy::PolicyCatalog;
use credit_engine_core::underwriting::{assess_risk, evaluate_policy_checks};
use credit_engine_core::{with_metadata, CreditEngine, EngineConfig};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortisation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct InstallmentInput {
    principal: Decimal,
    annual_rate: Decimal,
    term_months: u32,
}

#[derive(Deserialize)]
struct MaxPrincipalInput {
    max_installment: Decimal,
    annual_rate: Decimal,
    term_months: u32,
}

#[napi]
pub fn compute_installment(input_json: String) -> NapiResult<String> {
    let start = Instant::now();
    let input: InstallmentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let installment =
        amortization::compute_installment(input.principal, input.annual_rate, input.term_months)
            .map_err(to_napi_error)?;
    let output = with_metadata(
        "Level-payment amortisation, monthly compounding",
        &serde_json::json!({ "term_months": input.term_months }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        serde_json::json!({ "installment": installment }),
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compute_max_principal(input_json: String) -> NapiResult<String> {
    let start = Instant::now();
    let input: MaxPrincipalInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let max_principal = amortization::compute_max_principal(
        input.max_installment,
        input.annual_rate,
        input.term_months,
    )
    .map_err(to_napi_error)?;
    let output = with_metadata(
        "Inverse level-payment amortisation",
        &serde_json::json!({ "term_months": input.term_months }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        serde_json::json!({ "max_principal": max_principal }),
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Underwriting
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EvaluationInput {
    application: Application,
    #[serde(default)]
    policies: Option<PolicyCatalog>,
    #[serde(default)]
    arbitration: Option<ArbitrationOptions>,
}

impl EvaluationInput {
    fn catalog(&self) -> NapiResult<PolicyCatalog> {
        match &self.policies {
            Some(catalog) => {
                catalog.validate().map_err(to_napi_error)?;
                Ok(catalog.clone())
            }
            None => Ok(PolicyCatalog::reference()),
        }
    }
}

/// Policy checks and risk score for an application, without arbitration.
#[napi]
pub fn assess_application(input_json: String) -> NapiResult<String> {
    let start = Instant::now();
    let input: EvaluationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let catalog = input.catalog()?;
    let policy = catalog
        .get(&input.application.product_type)
        .map_err(to_napi_error)?;
    let checks = evaluate_policy_checks(&input.application, policy).map_err(to_napi_error)?;
    let risk = assess_risk(&input.application, &checks).map_err(to_napi_error)?;

    let output = with_metadata(
        "Policy checks and additive risk score (no arbitration)",
        &serde_json::json!({ "product_type": input.application.product_type }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        serde_json::json!({ "policy_checks": checks, "risk": risk }),
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Full decision with no collaborators configured; always decided on rules.
#[napi]
pub fn evaluate_application(input_json: String) -> NapiResult<String> {
    let input: EvaluationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = EngineConfig::default()
        .with_catalog(input.catalog()?)
        .with_arbitration(input.arbitration.clone().unwrap_or_default());
    let engine = CreditEngine::new(config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(to_napi_error)?;
    let decision = runtime.block_on(engine.evaluate(&input.application));
    serde_json::to_string(&decision).map_err(to_napi_error)
}

#[napi]
pub fn default_policies() -> NapiResult<String> {
    serde_json::to_string(&PolicyCatalog::reference()).map_err(to_napi_error)
}
