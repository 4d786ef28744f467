use thiserror::Error;

use crate::application::ProductType;

#[derive(Debug, Error)]
pub enum CreditEngineError {
    #[error("No policy bound for product type: {product_type}")]
    PolicyNotFound { product_type: ProductType },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CreditEngineError {
    pub(crate) fn overflow(context: &str) -> Self {
        CreditEngineError::ArithmeticOverflow {
            context: context.to_string(),
        }
    }
}

impl From<serde_json::Error> for CreditEngineError {
    fn from(e: serde_json::Error) -> Self {
        CreditEngineError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "yaml")]
impl From<serde_yaml::Error> for CreditEngineError {
    fn from(e: serde_yaml::Error) -> Self {
        CreditEngineError::SerializationError(e.to_string())
    }
}
