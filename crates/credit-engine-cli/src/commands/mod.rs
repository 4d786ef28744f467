pub mod amortization;
pub mod evaluate;
pub mod policy;
