//! Core data types shared across the pipeline

pub mod transaction;
pub mod verdict;

pub use transaction::TransactionRecord;
pub use verdict::{AnalysisOutput, FraudType, Verdict};
