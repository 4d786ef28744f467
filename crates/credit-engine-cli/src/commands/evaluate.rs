use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use credit_engine_core::application::Application;
use credit_engine_core::decision::arbiter::ArbitrationOptions;
use credit_engine_core::decision::brief;
use credit_engine_core::decision::providers::{
    ProviderError, Recommendation, RecommendationProvider, SimilarCase, SimilarCaseProvider,
};
use credit_engine_core::policy::PolicyCatalog;
use credit_engine_core::underwriting::{
    assess_risk, evaluate_policy_checks, score_breakdown, PolicyCheck, RiskAssessment,
    RiskScoreBreakdown,
};
use credit_engine_core::{with_metadata, CreditEngine, EngineConfig};

use crate::config::CliConfig;
use crate::input;

/// Arguments for a full credit decision
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to application JSON (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Policy catalog file, JSON or YAML (overrides CDE_POLICY_FILE)
    #[arg(long)]
    pub policies: Option<String>,

    /// Canned recommendation JSON served as the recommendation provider
    #[arg(long)]
    pub recommendation: Option<String>,

    /// Canned similar-case list JSON served as the similar-case provider
    #[arg(long)]
    pub similar_cases: Option<String>,

    /// Approve grade A/B without a recommendation (overrides
    /// CDE_APPROVE_WITHOUT_RECOMMENDATION)
    #[arg(long)]
    pub approve_without_recommendation: Option<bool>,
}

/// Arguments for policy checks and scoring without arbitration
#[derive(Args)]
pub struct AssessArgs {
    /// Path to application JSON (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Policy catalog file, JSON or YAML (overrides CDE_POLICY_FILE)
    #[arg(long)]
    pub policies: Option<String>,

    /// Include the plain-text analyst brief
    #[arg(long)]
    pub brief: bool,
}

// ---------------------------------------------------------------------------
// File-backed collaborators
// ---------------------------------------------------------------------------

struct FileRecommendation(Recommendation);

#[async_trait]
impl RecommendationProvider for FileRecommendation {
    async fn recommend(
        &self,
        _application: &Application,
        _checks: &[PolicyCheck],
        _similar_cases: &[SimilarCase],
    ) -> Result<Recommendation, ProviderError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "recommendation-file"
    }
}

struct FileSimilarCases(Vec<SimilarCase>);

#[async_trait]
impl SimilarCaseProvider for FileSimilarCases {
    async fn find_similar(
        &self,
        _application: &Application,
    ) -> Result<Vec<SimilarCase>, ProviderError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "similar-cases-file"
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn run_evaluate(
    args: EvaluateArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let application = read_application(args.input.as_deref())?;
    let catalog = load_catalog(args.policies.as_deref(), config)?;

    let options = ArbitrationOptions {
        approve_prime_without_recommendation: args
            .approve_without_recommendation
            .unwrap_or(config.approve_without_recommendation),
        ..ArbitrationOptions::default()
    };
    let mut engine_config = EngineConfig::default()
        .with_catalog(catalog)
        .with_arbitration(options.clone());
    if let Some(ref path) = args.recommendation {
        let rec: Recommendation = input::file::read_json(path)?;
        engine_config = engine_config.with_recommendation_provider(Arc::new(FileRecommendation(rec)));
    }
    if let Some(ref path) = args.similar_cases {
        let cases: Vec<SimilarCase> = input::file::read_json(path)?;
        engine_config = engine_config.with_similar_case_provider(Arc::new(FileSimilarCases(cases)));
    }

    let engine = CreditEngine::new(engine_config);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let decision = runtime.block_on(engine.evaluate(&application));

    let mut warnings = Vec::new();
    if !decision.missing_documents.is_empty() {
        warnings.push(format!(
            "Missing documents: {}",
            decision.missing_documents.join(", ")
        ));
    }
    if let Some(role) = decision.requires_approval {
        warnings.push(format!("Requires {:?} sign-off", role));
    }

    let output = with_metadata(
        "Policy checks, additive risk score, grade-gated arbitration",
        &json!({
            "product_type": application.product_type,
            "approve_prime_without_recommendation": options.approve_prime_without_recommendation,
            "conditional_min_confidence": options.conditional_min_confidence.to_string(),
            "conditional_amount_factor": options.conditional_amount_factor.to_string(),
            "processing_fee_rate": options.processing_fee_rate.to_string(),
        }),
        warnings,
        decision.processing_time_us,
        decision,
    );
    Ok(serde_json::to_value(output)?)
}

#[derive(Serialize)]
struct AssessmentReport {
    application_id: String,
    policy_checks: Vec<PolicyCheck>,
    breakdown: RiskScoreBreakdown,
    risk: RiskAssessment,
    missing_documents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    brief: Option<String>,
}

pub fn run_assess(args: AssessArgs, config: &CliConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let application = read_application(args.input.as_deref())?;
    let catalog = load_catalog(args.policies.as_deref(), config)?;
    let policy = catalog.get(&application.product_type)?;

    let policy_checks = evaluate_policy_checks(&application, policy)?;
    let breakdown = score_breakdown(&application, &policy_checks)?;
    let risk = assess_risk(&application, &policy_checks)?;
    let brief = args
        .brief
        .then(|| brief::render(&application, &policy_checks, &[]));

    let warnings: Vec<String> = policy_checks
        .iter()
        .filter(|c| !c.passed)
        .map(|c| format!("{} failed: {}", c.rule, c.message))
        .collect();

    let report = AssessmentReport {
        application_id: application.application_id.clone(),
        missing_documents: application.missing_documents(&policy.required_documents),
        policy_checks,
        breakdown,
        risk,
        brief,
    };

    let output = with_metadata(
        "Policy checks and additive risk score (no arbitration)",
        &json!({ "product_type": application.product_type }),
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    );
    Ok(serde_json::to_value(output)?)
}

fn read_application(path: Option<&str>) -> Result<Application, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(application) = input::stdin::read_stdin("application")? {
        Ok(application)
    } else {
        Err("An application is required: provide --input or pipe JSON on stdin".into())
    }
}

pub(crate) fn load_catalog(
    path: Option<&str>,
    config: &CliConfig,
) -> Result<PolicyCatalog, Box<dyn std::error::Error>> {
    let catalog = match path.or(config.policy_file.as_deref()) {
        Some(path) => input::file::read_catalog(path)?,
        None => PolicyCatalog::reference(),
    };
    debug!(products = catalog.len(), "policy catalog loaded");
    Ok(catalog)
}
