//! Credit decision engine.
//!
//! Turns a loan or card application into an auditable approve / reject /
//! review decision. The pipeline is strictly linear per application:
//! catalog lookup, policy checks, risk scoring, optional collaborator
//! consultation, arbitration.
//!
//! The engine holds no persistent state and performs no I/O of its own;
//! the recommendation and similar-case collaborators are reached through
//! the traits in [`decision::providers`].

pub mod amortization;
pub mod application;
pub mod error;
pub mod policy;
pub mod types;

pub mod decision;
pub mod underwriting;

pub use decision::engine::{CreditEngine, EngineConfig};
pub use decision::Decision;
pub use error::CreditEngineError;
pub use types::*;

/// Standard result type for all credit-engine operations
pub type CreditEngineResult<T> = Result<T, CreditEngineError>;
