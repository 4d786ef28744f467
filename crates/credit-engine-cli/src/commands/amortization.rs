use std::time::Instant;

use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use credit_engine_core::amortization::{compute_installment, compute_max_principal};
use credit_engine_core::underwriting::ratios;
use credit_engine_core::{with_metadata, Money, Rate};

/// Arguments for the level installment (EMI) of a loan
#[derive(Args)]
pub struct InstallmentArgs {
    /// Principal amount
    #[arg(long)]
    pub principal: Decimal,

    /// Annual interest rate in percent (12 = 12% p.a.)
    #[arg(long)]
    pub rate: Decimal,

    /// Term in months (0 = revolving, no amortisation)
    #[arg(long)]
    pub term: u32,
}

/// Arguments for the largest principal an installment can service
#[derive(Args)]
pub struct MaxPrincipalArgs {
    /// Maximum affordable monthly installment
    #[arg(long)]
    pub installment: Decimal,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Decimal,

    /// Term in months
    #[arg(long)]
    pub term: u32,
}

/// Arguments for standalone affordability ratios
#[derive(Args)]
pub struct RatiosArgs {
    /// Monthly income (all sources)
    #[arg(long)]
    pub income: Decimal,

    /// Existing monthly obligations
    #[arg(long, default_value = "0")]
    pub existing_emi: Decimal,

    /// Proposed monthly installment
    #[arg(long, default_value = "0")]
    pub proposed_emi: Decimal,

    /// Loan amount, for loan-to-value
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Collateral value, for loan-to-value
    #[arg(long)]
    pub collateral: Option<Decimal>,

    /// Total outstanding debt, for debt-to-income
    #[arg(long)]
    pub total_debt: Option<Decimal>,
}

pub fn run_installment(args: InstallmentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let installment = compute_installment(args.principal, args.rate, args.term)?;

    let mut warnings = Vec::new();
    if args.term == 0 {
        warnings.push("Zero term: revolving product, no amortised installment".to_string());
    }

    let output = with_metadata(
        "Level-payment amortisation, monthly compounding",
        &json!({
            "principal": args.principal.to_string(),
            "annual_rate_pct": args.rate.to_string(),
            "term_months": args.term,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        json!({
            "installment": installment,
            "total_payable": installment * Decimal::from(args.term),
        }),
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_max_principal(args: MaxPrincipalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let max_principal = compute_max_principal(args.installment, args.rate, args.term)?;

    let output = with_metadata(
        "Inverse level-payment amortisation",
        &json!({
            "installment": args.installment.to_string(),
            "annual_rate_pct": args.rate.to_string(),
            "term_months": args.term,
        }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        json!({ "max_principal": max_principal }),
    );
    Ok(serde_json::to_value(output)?)
}

#[derive(Serialize)]
struct RatioReport {
    foir: Option<Rate>,
    ltv: Option<Rate>,
    dti: Option<Rate>,
    total_obligations: Money,
}

pub fn run_ratios(args: RatiosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let foir = ratios::obligation_to_income(args.income, args.existing_emi, args.proposed_emi);
    if foir.is_none() {
        warnings.push("Income is not positive: FOIR undefined".to_string());
    }
    let ltv = match (args.loan_amount, args.collateral) {
        (Some(loan), Some(collateral)) => ratios::loan_to_value(loan, collateral),
        _ => None,
    };
    let dti = args
        .total_debt
        .and_then(|debt| ratios::debt_to_income(args.income, debt));

    let report = RatioReport {
        foir,
        ltv,
        dti,
        total_obligations: args.existing_emi + args.proposed_emi,
    };

    let output = with_metadata(
        "FOIR = obligations / monthly income; LTV = loan / collateral; DTI = debt / annual income",
        &json!({ "monthly_income": args.income.to_string() }),
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    );
    Ok(serde_json::to_value(output)?)
}
