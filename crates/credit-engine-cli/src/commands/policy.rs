use clap::Args;
use serde_json::Value;

use credit_engine_core::application::ProductType;

use super::evaluate::load_catalog;
use crate::config::CliConfig;

/// Arguments for printing the policy catalog
#[derive(Args)]
pub struct PoliciesArgs {
    /// Policy catalog file, JSON or YAML (defaults to the reference catalog)
    #[arg(long)]
    pub policies: Option<String>,

    /// Show a single product, e.g. HOME_LOAN
    #[arg(long)]
    pub product: Option<String>,
}

pub fn run_policies(
    args: PoliciesArgs,
    config: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let catalog = load_catalog(args.policies.as_deref(), config)?;

    match args.product {
        Some(product) => {
            let policy = catalog.get(&ProductType::from(product))?;
            Ok(serde_json::to_value(policy)?)
        }
        None => {
            let policies: Vec<_> = catalog.iter().map(|(_, policy)| policy).collect();
            Ok(serde_json::to_value(policies)?)
        }
    }
}
