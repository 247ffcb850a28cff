//! PetrolGuard Analysis Library
//!
//! A forensic analysis and decision pipeline that flags potentially
//! fraudulent fuel-transaction records by combining independent signals:
//! error-level analysis of payment screenshots, OCR over pump readouts,
//! statistical outlier detection, and an ordered rule engine.

pub mod anomaly;
pub mod config;
pub mod engine;
pub mod forensics;
pub mod metrics;
pub mod ocr;
pub mod types;

pub use anomaly::AnomalyDetector;
pub use config::AppConfig;
pub use engine::{DecisionEngine, HistoryStore};
pub use forensics::{ElaAnalyzer, ElaReport};
pub use metrics::PipelineMetrics;
pub use ocr::{NumericReader, TextExtractor};
pub use types::{AnalysisOutput, FraudType, TransactionRecord, Verdict};
