use std::sync::Arc;

use async_trait::async_trait;
use credit_engine_core::amortization::round_currency;
use credit_engine_core::application::{
    Applicant, Application, EmploymentType, FinancialProfile, LoanRequest, ProductType,
    ResidenceType,
};
use credit_engine_core::decision::providers::{
    ProviderError, Recommendation, RecommendationLabel, RecommendationProvider, SimilarCase,
};
use credit_engine_core::decision::{ApprovalRole, DecidedBy, DecisionOutcome};
use credit_engine_core::policy::PolicyCatalog;
use credit_engine_core::underwriting::{PolicyCheck, PolicyRule, RiskGrade};
use credit_engine_core::{CreditEngine, EngineConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

fn base_application(product: ProductType) -> Application {
    Application {
        application_id: "APP-2024-0001".into(),
        customer_id: "CUST-0001".into(),
        product_type: product,
        applicant: Applicant {
            name: Some("Asha Rao".into()),
            age: 30,
            occupation: Some("Analyst".into()),
            employment_type: EmploymentType::Salaried,
            employer: Some("Acme Ltd".into()),
            years_employed: Some(dec!(5)),
            residence_type: ResidenceType::Owned,
            years_at_residence: Some(dec!(3)),
            dependents: Some(1),
        },
        financial: FinancialProfile {
            monthly_income: dec!(50_000),
            additional_income: None,
            existing_emi: None,
            assets: None,
            liabilities: None,
            collateral_value: None,
        },
        request: LoanRequest {
            amount: dec!(1_000_000),
            tenure_months: 36,
            purpose: Some("Home renovation".into()),
        },
        bureau_score: Some(750),
        internal_risk_score: None,
        trust_score: None,
        documents_provided: Vec::new(),
        channel: Some("BRANCH".into()),
        branch_code: None,
        submitted_at: None,
    }
}

struct Fixed(Recommendation);

#[async_trait]
impl RecommendationProvider for Fixed {
    async fn recommend(
        &self,
        _application: &Application,
        _checks: &[PolicyCheck],
        _similar_cases: &[SimilarCase],
    ) -> Result<Recommendation, ProviderError> {
        Ok(self.0.clone())
    }
}

struct Broken;

#[async_trait]
impl RecommendationProvider for Broken {
    async fn recommend(
        &self,
        _application: &Application,
        _checks: &[PolicyCheck],
        _similar_cases: &[SimilarCase],
    ) -> Result<Recommendation, ProviderError> {
        Err(ProviderError::Unavailable("connection refused".into()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

fn engine_with(rec: impl RecommendationProvider + 'static) -> CreditEngine {
    CreditEngine::new(EngineConfig::default().with_recommendation_provider(Arc::new(rec)))
}

// ===========================================================================
// Worked scenarios
// ===========================================================================

#[tokio::test]
async fn test_prime_personal_loan_approved_on_rules() {
    let engine = CreditEngine::default();
    let app = base_application(ProductType::PersonalLoan);
    let decision = engine.evaluate(&app).await;

    assert!(decision
        .policy_checks
        .iter()
        .filter(|c| c.rule.code().starts_with("HARD_"))
        .all(|c| c.passed));
    assert!(decision.risk.risk_grade <= RiskGrade::B);
    assert_eq!(decision.outcome, DecisionOutcome::Approved);
    assert_eq!(decision.decided_by, DecidedBy::Rules);

    let terms = decision.terms.as_ref().unwrap();
    // Capped by affordability: 25k of monthly headroom cannot service 1M.
    assert!(terms.amount > Decimal::ZERO && terms.amount < dec!(1_000_000));
    assert_eq!(terms.tenure_months, 36);
    assert_eq!(terms.processing_fee, round_currency(terms.amount * dec!(0.01)));
}

#[tokio::test]
async fn test_underage_home_loan_rejected_with_audit_fields() {
    let engine = CreditEngine::default();
    let mut app = base_application(ProductType::HomeLoan);
    app.applicant.age = 19;
    app.request.tenure_months = 240;

    let decision = engine.evaluate(&app).await;
    assert_eq!(decision.outcome, DecisionOutcome::Rejected);
    assert_eq!(decision.decided_by, DecidedBy::Rules);
    assert!(decision
        .rejection_reasons
        .contains(&"Minimum age requirement: 21".to_string()));
    assert!(decision.terms.is_none());

    let age = decision
        .policy_checks
        .iter()
        .find(|c| c.rule == PolicyRule::AgeMin)
        .unwrap();
    assert!(!age.passed);
    assert!(decision.risk.risk_score > Decimal::ZERO);
    assert!(decision.risk.default_probability > Decimal::ZERO);
}

#[tokio::test]
async fn test_near_prime_confident_recommendation_is_conditional() {
    let engine = engine_with(Fixed(Recommendation {
        label: RecommendationLabel::Approve,
        rationale: "Stable business income".into(),
        confidence: dec!(0.85),
    }));
    let mut app = base_application(ProductType::PersonalLoan);
    app.applicant.employment_type = EmploymentType::SelfEmployed;
    app.financial.monthly_income = dec!(100_000);
    app.request.amount = dec!(200_000);
    app.bureau_score = Some(680);

    let decision = engine.evaluate(&app).await;
    assert_eq!(decision.risk.risk_grade, RiskGrade::C);
    assert_eq!(decision.outcome, DecisionOutcome::ConditionalApproval);
    assert_eq!(decision.decided_by, DecidedBy::Ai);
    assert_eq!(decision.confidence, dec!(0.85));
    assert_eq!(decision.approved_amount(), Some(dec!(160_000)));
    assert_eq!(
        decision.conditions,
        vec![
            "Additional income proof required".to_string(),
            "Guarantor required for higher amounts".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_near_prime_review_goes_to_branch_manager() {
    let engine = engine_with(Fixed(Recommendation {
        label: RecommendationLabel::Review,
        rationale: "Thin file".into(),
        confidence: dec!(0.9),
    }));
    let mut app = base_application(ProductType::PersonalLoan);
    app.applicant.employment_type = EmploymentType::SelfEmployed;
    app.financial.monthly_income = dec!(100_000);
    app.request.amount = dec!(200_000);
    app.bureau_score = Some(680);

    let decision = engine.evaluate(&app).await;
    assert_eq!(decision.outcome, DecisionOutcome::ManualReview);
    assert_eq!(decision.requires_approval, Some(ApprovalRole::BranchManager));
}

// ===========================================================================
// Invariants
// ===========================================================================

#[tokio::test]
async fn test_hard_failure_dominates_confident_approval() {
    let engine = engine_with(Fixed(Recommendation {
        label: RecommendationLabel::Approve,
        rationale: "Excellent".into(),
        confidence: Decimal::ONE,
    }));
    let mut app = base_application(ProductType::PersonalLoan);
    app.bureau_score = Some(900);
    app.request.amount = dec!(5_000_000);

    let decision = engine.evaluate(&app).await;
    assert_eq!(decision.outcome, DecisionOutcome::Rejected);
    assert_eq!(decision.decided_by, DecidedBy::Rules);
    assert_eq!(decision.confidence, Decimal::ZERO);
    assert_eq!(
        decision.rejection_reasons,
        vec!["Maximum loan amount: 2500000".to_string()]
    );
}

#[tokio::test]
async fn test_provider_failure_still_yields_rules_decision() {
    let engine = engine_with(Broken);
    let app = base_application(ProductType::PersonalLoan);
    let decision = engine.evaluate(&app).await;

    assert_eq!(decision.decided_by, DecidedBy::Rules);
    assert_eq!(decision.outcome, DecisionOutcome::Approved);
}

#[tokio::test]
async fn test_unknown_product_routes_to_manual_review() {
    let engine = CreditEngine::default();
    let app = base_application(ProductType::from("gold_loan"));
    let decision = engine.evaluate(&app).await;

    assert_eq!(decision.outcome, DecisionOutcome::ManualReview);
    assert_eq!(decision.risk.risk_grade, RiskGrade::D);
    assert_eq!(decision.requires_approval, Some(ApprovalRole::BranchManager));
    assert!(decision.rationale.contains("GOLD_LOAN"));
}

#[tokio::test]
async fn test_revolving_card_has_no_amortisation() {
    let engine = CreditEngine::default();
    let mut app = base_application(ProductType::CreditCard);
    app.request.amount = dec!(100_000);
    app.request.tenure_months = 0;
    app.bureau_score = Some(820);

    let decision = engine.evaluate(&app).await;
    assert!(decision
        .policy_checks
        .iter()
        .all(|c| c.rule != PolicyRule::TenureMin && c.rule != PolicyRule::TenureMax));
    let foir = decision
        .policy_checks
        .iter()
        .find(|c| c.rule == PolicyRule::Foir)
        .unwrap();
    assert!(foir.passed);
    if let Some(terms) = &decision.terms {
        assert_eq!(terms.installment, Decimal::ZERO);
    }
}

#[tokio::test]
async fn test_missing_documents_are_reported_without_changing_outcome() {
    let engine = CreditEngine::default();
    let mut app = base_application(ProductType::PersonalLoan);
    app.documents_provided = vec!["pan".into(), "Aadhaar".into(), "SALARY_SLIP".into()];

    let with_gap = engine.evaluate(&app).await;
    assert_eq!(with_gap.missing_documents, vec!["BANK_STATEMENT".to_string()]);

    app.documents_provided.push("BANK_STATEMENT".into());
    let complete = engine.evaluate(&app).await;
    assert!(complete.missing_documents.is_empty());
    assert_eq!(with_gap.outcome, complete.outcome);
    assert_eq!(with_gap.risk, complete.risk);
}

#[tokio::test]
async fn test_catalog_replacement_is_seen_by_clones() {
    let engine = CreditEngine::with_catalog(PolicyCatalog::reference());
    let clone = engine.clone();

    let mut policy = PolicyCatalog::reference()
        .get(&ProductType::PersonalLoan)
        .unwrap()
        .clone();
    policy.max_loan_amount = dec!(500_000);
    engine.catalog().upsert(policy);

    let decision = clone
        .evaluate(&base_application(ProductType::PersonalLoan))
        .await;
    assert_eq!(decision.outcome, DecisionOutcome::Rejected);
}

#[tokio::test]
async fn test_unpayable_tenure_is_rejected_not_escalated() {
    let engine = CreditEngine::default();
    let mut app = base_application(ProductType::PersonalLoan);
    app.request.tenure_months = 10_000;

    let decision = engine.evaluate(&app).await;
    assert_eq!(decision.outcome, DecisionOutcome::Rejected);
    assert_eq!(decision.decided_by, DecidedBy::Rules);
    assert!(decision
        .rejection_reasons
        .iter()
        .any(|r| r == "Maximum tenure: 60 months"));
    let tenure = decision
        .policy_checks
        .iter()
        .find(|c| c.rule == PolicyRule::TenureMax)
        .unwrap();
    assert!(!tenure.passed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unrepresentable_trust_score_falls_back_inside_task() {
    let engine = CreditEngine::default();
    let mut app = base_application(ProductType::PersonalLoan);
    app.trust_score = Some(Decimal::MAX);

    let handle = tokio::spawn(async move { engine.evaluate(&app).await });
    let decision = handle.await.unwrap();

    assert_eq!(decision.outcome, DecisionOutcome::ManualReview);
    assert_eq!(decision.risk.risk_grade, RiskGrade::D);
    assert_eq!(decision.requires_approval, Some(ApprovalRole::BranchManager));
    assert!(decision.terms.is_none());
}

#[tokio::test]
async fn test_unrepresentable_income_falls_back() {
    let engine = CreditEngine::default();
    let mut app = base_application(ProductType::PersonalLoan);
    app.financial.monthly_income = Decimal::MAX;
    app.financial.additional_income = Some(Decimal::ONE);

    let decision = engine.evaluate(&app).await;
    assert_eq!(decision.outcome, DecisionOutcome::ManualReview);
    assert_eq!(decision.decided_by, DecidedBy::Rules);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_evaluations_are_independent() {
    let engine = CreditEngine::default();
    let mut handles = Vec::new();
    for i in 0..32u32 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let mut app = base_application(ProductType::PersonalLoan);
            app.application_id = format!("APP-{i}");
            app.applicant.age = if i % 2 == 0 { 30 } else { 18 };
            engine.evaluate(&app).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let decision = handle.await.unwrap();
        assert_eq!(decision.application_id, format!("APP-{i}"));
        let expected = if i % 2 == 0 {
            DecisionOutcome::Approved
        } else {
            DecisionOutcome::Rejected
        };
        assert_eq!(decision.outcome, expected);
    }
}

#[test]
fn test_decision_serialises_wire_names() {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let decision = rt.block_on(CreditEngine::default().evaluate(&base_application(ProductType::PersonalLoan)));
    let json = serde_json::to_value(&decision).unwrap();

    assert_eq!(json["outcome"], "APPROVED");
    assert_eq!(json["decided_by"], "RULES");
    assert_eq!(json["product_type"], "PERSONAL_LOAN");
    assert_eq!(json["policy_checks"][0]["rule"], "HARD_AGE_MIN");
}
