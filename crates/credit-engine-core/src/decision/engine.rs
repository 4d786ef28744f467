//! Per-application orchestration.
//!
//! One evaluation runs catalog lookup, policy checks, scoring, the two
//! optional collaborator consultations and arbitration, in that order.
//! Any fault collapses into a conservative manual-review decision, so
//! [`CreditEngine::evaluate`] never returns an error.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::arbiter::{arbitrate, ArbitrationInput, ArbitrationOptions};
use super::providers::{
    validate_cases, Consultation, Recommendation, RecommendationProvider, SimilarCase,
    SimilarCaseProvider,
};
use super::Decision;
use crate::application::Application;
use crate::policy::{PolicyCatalog, SharedCatalog};
use crate::underwriting::checks::has_hard_failure;
use crate::underwriting::{assess_risk, evaluate_policy_checks, PolicyCheck};
use crate::CreditEngineResult;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct EngineConfig {
    pub catalog: SharedCatalog,
    pub recommendation_provider: Option<Arc<dyn RecommendationProvider>>,
    pub similar_case_provider: Option<Arc<dyn SimilarCaseProvider>>,
    pub arbitration: ArbitrationOptions,
}

impl EngineConfig {
    pub fn with_catalog(mut self, catalog: impl Into<SharedCatalog>) -> Self {
        self.catalog = catalog.into();
        self
    }

    pub fn with_recommendation_provider(
        mut self,
        provider: Arc<dyn RecommendationProvider>,
    ) -> Self {
        self.recommendation_provider = Some(provider);
        self
    }

    pub fn with_similar_case_provider(mut self, provider: Arc<dyn SimilarCaseProvider>) -> Self {
        self.similar_case_provider = Some(provider);
        self
    }

    pub fn with_arbitration(mut self, options: ArbitrationOptions) -> Self {
        self.arbitration = options;
        self
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("products", &self.catalog.snapshot().len())
            .field(
                "recommendation_provider",
                &self.recommendation_provider.as_ref().map(|p| p.name().to_string()),
            )
            .field(
                "similar_case_provider",
                &self.similar_case_provider.as_ref().map(|p| p.name().to_string()),
            )
            .field("arbitration", &self.arbitration)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Cheap to clone; clones share the catalog and providers.
#[derive(Debug, Clone, Default)]
pub struct CreditEngine {
    config: Arc<EngineConfig>,
}

impl CreditEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Engine over `catalog` with no collaborators configured.
    pub fn with_catalog(catalog: PolicyCatalog) -> Self {
        Self::new(EngineConfig::default().with_catalog(catalog))
    }

    /// Live catalog handle. Updates apply to evaluations that start
    /// afterwards.
    pub fn catalog(&self) -> &SharedCatalog {
        &self.config.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate one application. Always yields a decision.
    pub async fn evaluate(&self, application: &Application) -> Decision {
        let started = Instant::now();
        match self.run(application, started).await {
            Ok(decision) => {
                info!(
                    application_id = %decision.application_id,
                    outcome = %decision.outcome,
                    grade = %decision.risk.risk_grade,
                    decided_by = ?decision.decided_by,
                    processing_time_us = decision.processing_time_us,
                    "credit decision made"
                );
                decision
            }
            Err(err) => {
                error!(
                    application_id = %application.application_id,
                    error = %err,
                    "evaluation failed, routing to manual review"
                );
                Decision::fallback(application, &err, started.elapsed())
            }
        }
    }

    async fn run(
        &self,
        application: &Application,
        started: Instant,
    ) -> CreditEngineResult<Decision> {
        let catalog = self.config.catalog.snapshot();
        let policy = catalog.get(&application.product_type)?;

        let checks = evaluate_policy_checks(application, policy)?;
        let risk = assess_risk(application, &checks)?;
        debug!(
            application_id = %application.application_id,
            score = %risk.risk_score,
            grade = %risk.risk_grade,
            "risk assessed"
        );

        let similar_cases = self.consult_similar_cases(application).await;
        let recommendation = if has_hard_failure(&checks) {
            Consultation::Skipped
        } else {
            self.consult_recommendation(application, &checks, &similar_cases)
                .await
        };

        let arbitration = arbitrate(
            &ArbitrationInput {
                application,
                policy,
                checks: &checks,
                risk: &risk,
                recommendation: &recommendation,
            },
            &self.config.arbitration,
        )?;
        let missing_documents = application.missing_documents(&policy.required_documents);

        Ok(Decision::from_arbitration(
            application,
            arbitration,
            risk,
            checks,
            similar_cases,
            missing_documents,
            started.elapsed(),
        ))
    }

    async fn consult_similar_cases(&self, application: &Application) -> Vec<SimilarCase> {
        let Some(provider) = &self.config.similar_case_provider else {
            return Vec::new();
        };
        match provider
            .find_similar(application)
            .await
            .and_then(validate_cases)
        {
            Ok(cases) => cases,
            Err(err) => {
                warn!(
                    application_id = %application.application_id,
                    provider = provider.name(),
                    error = %err,
                    "similar-case lookup failed, continuing without cases"
                );
                Vec::new()
            }
        }
    }

    async fn consult_recommendation(
        &self,
        application: &Application,
        checks: &[PolicyCheck],
        similar_cases: &[SimilarCase],
    ) -> Consultation<Recommendation> {
        let Some(provider) = &self.config.recommendation_provider else {
            return Consultation::NotConfigured;
        };
        match provider
            .recommend(application, checks, similar_cases)
            .await
            .and_then(Recommendation::validated)
        {
            Ok(rec) => Consultation::Received(rec),
            Err(err) => {
                warn!(
                    application_id = %application.application_id,
                    provider = provider.name(),
                    error = %err,
                    "recommendation unavailable, deciding on rules"
                );
                Consultation::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}
