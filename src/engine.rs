//! Rule-based decision engine
//!
//! Runs five ordered checks against one transaction record. The order is
//! a first-class table: evaluation walks it top to bottom and the first
//! check that fires is authoritative, so every verdict carries at most
//! one fraud type. Component failures never escape the engine; each
//! degrades to the neutral result documented on the component.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::anomaly::AnomalyDetector;
use crate::config::{AppConfig, PricingConfig, PumpConfig};
use crate::forensics::{ElaAnalyzer, ElaReport};
use crate::ocr::{NumericReader, TextExtractor};
use crate::types::{AnalysisOutput, FraudType, TransactionRecord, Verdict};

/// Queryable store of previously seen transaction ids, supplied by the
/// surrounding application.
pub trait HistoryStore {
    fn contains_id(&self, transaction_id: &str) -> bool;
}

impl HistoryStore for HashSet<String> {
    fn contains_id(&self, transaction_id: &str) -> bool {
        self.contains(transaction_id)
    }
}

/// A triggered rule: the category plus its explanation.
struct Signal {
    fraud_type: FraudType,
    reason: String,
}

/// Everything a check may consult for one invocation.
struct CheckContext<'a> {
    record: &'a TransactionRecord,
    history: &'a dyn HistoryStore,
    detector: &'a AnomalyDetector,
}

type Check = fn(&DecisionEngine, &CheckContext<'_>) -> Option<Signal>;

/// Priority order of the fraud checks. First match wins.
const CHECKS: &[Check] = &[
    DecisionEngine::check_duplicate,
    DecisionEngine::check_pump_reading,
    DecisionEngine::check_price_consistency,
    DecisionEngine::check_anomaly,
    DecisionEngine::check_screenshot,
];

/// Orchestrates the forensic components against a transaction record.
pub struct DecisionEngine {
    pricing: PricingConfig,
    pump: PumpConfig,
    forensics: ElaAnalyzer,
    text_ocr: TextExtractor,
    numeric_ocr: NumericReader,
    /// Swapped atomically on retrain; each analysis snapshots it once.
    detector: RwLock<Arc<AnomalyDetector>>,
}

impl DecisionEngine {
    /// Build an engine from configuration and a trained (or disabled)
    /// anomaly detector.
    pub fn new(config: &AppConfig, detector: AnomalyDetector) -> Self {
        Self {
            pricing: config.pricing.clone(),
            pump: config.pump.clone(),
            forensics: ElaAnalyzer::new(config.forensics.recompress_quality),
            text_ocr: TextExtractor::new(&config.ocr),
            numeric_ocr: NumericReader::new(&config.ocr),
            detector: RwLock::new(Arc::new(detector)),
        }
    }

    /// Replace the anomaly detector. Analyses already in flight keep
    /// their snapshot; later ones see the new model.
    pub fn swap_detector(&self, detector: AnomalyDetector) {
        let replacement = Arc::new(detector);
        match self.detector.write() {
            Ok(mut guard) => *guard = replacement,
            Err(poisoned) => *poisoned.into_inner() = replacement,
        }
    }

    /// Analyze one transaction against the supplied history.
    ///
    /// Always completes with a verdict; internal failures degrade per
    /// component. The forensic difference image is produced whenever a
    /// readable screenshot is attached, independent of the verdict.
    pub fn analyze(&self, record: &TransactionRecord, history: &dyn HistoryStore) -> AnalysisOutput {
        let detector = match self.detector.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        };
        let ctx = CheckContext {
            record,
            history,
            detector: &detector,
        };

        let evidence = self.collect_evidence(record);

        let signal = CHECKS.iter().find_map(|check| check(self, &ctx));

        let mut verdict = match signal {
            Some(signal) => {
                info!(
                    transaction_id = %record.transaction_id,
                    fraud_type = ?signal.fraud_type,
                    reason = %signal.reason,
                    "Transaction flagged"
                );
                Verdict::fraud(&record.transaction_id, signal.fraud_type, signal.reason)
            }
            None => {
                debug!(transaction_id = %record.transaction_id, "Transaction clean");
                Verdict::clean(&record.transaction_id)
            }
        };
        verdict.evidence_ref = evidence.as_ref().map(|report| report.artifact_id.clone());

        AnalysisOutput { verdict, evidence }
    }

    /// Error-level analysis of the screenshot, when one is attached.
    /// Failure means no artifact, never a failed analysis.
    fn collect_evidence(&self, record: &TransactionRecord) -> Option<ElaReport> {
        let path = record.payment_screenshot.as_deref()?;
        match self.forensics.analyze(path) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(
                    transaction_id = %record.transaction_id,
                    error = %e,
                    "No forensic artifact produced"
                );
                None
            }
        }
    }

    /// Check 1: a repeated transaction id always wins.
    fn check_duplicate(&self, ctx: &CheckContext<'_>) -> Option<Signal> {
        if ctx.history.contains_id(&ctx.record.transaction_id) {
            return Some(Signal {
                fraud_type: FraudType::Duplicate,
                reason: "Duplicate Transaction ID detected".to_string(),
            });
        }
        None
    }

    /// Check 2: meter readout vs claimed volume. No readable numbers
    /// means inconclusive, not a mismatch.
    fn check_pump_reading(&self, ctx: &CheckContext<'_>) -> Option<Signal> {
        let path = ctx.record.pump_image.as_deref()?;
        let readings = match self.numeric_ocr.read(path) {
            Ok(readings) => readings,
            Err(e) => {
                warn!(
                    transaction_id = %ctx.record.transaction_id,
                    error = %e,
                    "Pump readout unreadable, skipping cross-check"
                );
                return None;
            }
        };

        if readings.is_empty() {
            return None;
        }
        if reading_matches_claim(&readings, ctx.record.fuel_liters, self.pump.reading_tolerance) {
            return None;
        }

        Some(Signal {
            fraud_type: FraudType::PumpMismatch,
            reason: format!(
                "CCTV Mismatch: Pump reads {:?} but staff entered {}",
                readings, ctx.record.fuel_liters
            ),
        })
    }

    /// Check 3: claimed bill vs volume x unit price, relative tolerance.
    fn check_price_consistency(&self, ctx: &CheckContext<'_>) -> Option<Signal> {
        let expected = ctx.record.fuel_liters * self.pricing.unit_price;
        if (expected - ctx.record.bill_amount).abs() <= expected * self.pricing.tolerance {
            return None;
        }

        Some(Signal {
            fraud_type: FraudType::AmountMismatch,
            reason: format!(
                "Mismatch: Dispensed {}L but billed {}",
                ctx.record.fuel_liters, ctx.record.bill_amount
            ),
        })
    }

    /// Check 4: statistical outlier in (volume, amount).
    fn check_anomaly(&self, ctx: &CheckContext<'_>) -> Option<Signal> {
        if ctx
            .detector
            .is_anomalous(ctx.record.fuel_liters, ctx.record.bill_amount)
        {
            return Some(Signal {
                fraud_type: FraudType::Anomaly,
                reason: "Abnormal transaction pattern detected by model".to_string(),
            });
        }
        None
    }

    /// Check 5: screenshot heuristics. An unreadable screenshot yields
    /// empty text, which fails the keyword check and flags the record
    /// for review rather than passing silently.
    fn check_screenshot(&self, ctx: &CheckContext<'_>) -> Option<Signal> {
        let path = ctx.record.payment_screenshot.as_deref()?;
        let text = match self.text_ocr.extract(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    transaction_id = %ctx.record.transaction_id,
                    error = %e,
                    "Screenshot text extraction failed"
                );
                String::new()
            }
        };

        let analysis = TextExtractor::inspect(&text, ctx.record.bill_amount);
        if !analysis.suspicious {
            return None;
        }

        Some(Signal {
            fraud_type: FraudType::ScreenshotTampered,
            reason: format!("Screenshot Analysis: {}", analysis.reasons.join(", ")),
        })
    }
}

/// True when any reading falls within `tolerance` of the claim.
fn reading_matches_claim(readings: &[f64], claimed: f64, tolerance: f64) -> bool {
    readings.iter().any(|r| (r - claimed).abs() < tolerance)
}
