use std::env;
use std::fmt;

/// Runtime settings read from the environment (and `.env`, if present).
/// Command-line flags take precedence over everything here.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub log_level: String,
    pub policy_file: Option<String>,
    pub approve_without_recommendation: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            policy_file: None,
            approve_without_recommendation: true,
        }
    }
}

impl CliConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let log_level = lookup("CDE_LOG_LEVEL").unwrap_or(defaults.log_level);
        let policy_file = lookup("CDE_POLICY_FILE").filter(|p| !p.trim().is_empty());
        let approve_without_recommendation = match lookup("CDE_APPROVE_WITHOUT_RECOMMENDATION") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                key: "CDE_APPROVE_WITHOUT_RECOMMENDATION",
                value: raw,
            })?,
            None => defaults.approve_without_recommendation,
        };

        Ok(Self {
            log_level,
            policy_file,
            approve_without_recommendation,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidFlag { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidFlag { key, value } => {
                write!(f, "{key} must be true or false, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
