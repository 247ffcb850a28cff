//! Fraud verdict data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::forensics::ElaReport;

/// Fraud category assigned to a flagged transaction.
///
/// Wire names match the historical alert format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FraudType {
    /// Payment screenshot failed the confirmation-text heuristics
    #[serde(rename = "SCREENSHOT_TAMPERED")]
    ScreenshotTampered,
    /// Claimed bill disagrees with volume x unit price
    #[serde(rename = "AMOUNT_MISMATCH")]
    AmountMismatch,
    /// Transaction id already present in history
    #[serde(rename = "DUPLICATE")]
    Duplicate,
    /// Statistical outlier in the (volume, amount) feature space
    #[serde(rename = "ANOMALY")]
    Anomaly,
    /// Pump/meter photograph disagrees with the claimed volume
    #[serde(rename = "PUMP_MISMATCH")]
    PumpMismatch,
}

/// Final decision for one transaction.
///
/// At most one fraud type is ever set: the engine is single-verdict,
/// not multi-label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Associated transaction id
    pub transaction_id: String,

    /// Whether the transaction was flagged
    pub is_fraud: bool,

    /// Category of the first triggered rule, if any
    pub fraud_type: Option<FraudType>,

    /// Human-readable explanation (empty when clean)
    pub reason: String,

    /// Identifier of the forensic evidence artifact, if one was produced
    pub evidence_ref: Option<String>,

    /// Verdict generation timestamp
    pub analyzed_at: DateTime<Utc>,
}

impl Verdict {
    /// A clean verdict with no triggered rule.
    pub fn clean(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            is_fraud: false,
            fraud_type: None,
            reason: String::new(),
            evidence_ref: None,
            analyzed_at: Utc::now(),
        }
    }

    /// A fraud verdict for the given rule and reason.
    pub fn fraud(
        transaction_id: impl Into<String>,
        fraud_type: FraudType,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            is_fraud: true,
            fraud_type: Some(fraud_type),
            reason: reason.into(),
            evidence_ref: None,
            analyzed_at: Utc::now(),
        }
    }
}

/// Verdict plus the ephemeral forensic artifact the caller may persist.
///
/// The pixel buffer lives only as long as this value; `verdict.evidence_ref`
/// carries the artifact id for whatever storage the caller arranges.
#[derive(Debug)]
pub struct AnalysisOutput {
    pub verdict: Verdict,
    pub evidence: Option<ElaReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraud_type_wire_names() {
        let json = serde_json::to_string(&FraudType::ScreenshotTampered).unwrap();
        assert_eq!(json, "\"SCREENSHOT_TAMPERED\"");

        let parsed: FraudType = serde_json::from_str("\"PUMP_MISMATCH\"").unwrap();
        assert_eq!(parsed, FraudType::PumpMismatch);
    }

    #[test]
    fn test_verdict_serialization() {
        let verdict = Verdict::fraud("TXN-9", FraudType::Duplicate, "Duplicate Transaction ID detected");

        let json = serde_json::to_string(&verdict).unwrap();
        let deserialized: Verdict = serde_json::from_str(&json).unwrap();

        assert!(deserialized.is_fraud);
        assert_eq!(deserialized.fraud_type, Some(FraudType::Duplicate));
        assert_eq!(deserialized.reason, "Duplicate Transaction ID detected");
    }

    #[test]
    fn test_clean_verdict_has_no_type() {
        let verdict = Verdict::clean("TXN-10");
        assert!(!verdict.is_fraud);
        assert!(verdict.fraud_type.is_none());
        assert!(verdict.reason.is_empty());
    }
}
