//! Statistical outlier detection over historical transaction patterns
//!
//! An isolation forest is fitted offline over the 2-D feature space
//! (fuel liters, bill amount). The decision threshold is calibrated so
//! that the configured contamination fraction of the training data falls
//! on the anomalous side. The fitted detector is read-only; retraining
//! means constructing a new detector and swapping it in at the engine.

use extended_isolation_forest::{Forest, ForestOptions};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ModelConfig;

/// Fewer rows than this cannot support a meaningful forest.
const MIN_TRAINING_ROWS: usize = 10;

/// Typed training failure. The serving path never sees these: the
/// fail-open constructor converts them into a detector without a model.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("failed to read training dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed training dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("training dataset has {0} rows, need at least {MIN_TRAINING_ROWS}")]
    TooFewRows(usize),
    #[error("failed to fit isolation forest: {0}")]
    Fit(String),
}

/// One row of the historical dataset.
#[derive(Debug, Deserialize)]
struct DatasetRow {
    #[serde(rename = "FuelLiters")]
    fuel_liters: f64,
    #[serde(rename = "BillAmount")]
    bill_amount: f64,
}

struct FittedModel {
    forest: Forest<f64, 2>,
    threshold: f64,
}

/// Outlier detector over (fuel liters, bill amount) pairs.
///
/// Absence of a model is a valid state: the detector then reports
/// "not anomalous" for every input (fail-open).
pub struct AnomalyDetector {
    model: Option<FittedModel>,
}

impl AnomalyDetector {
    /// A detector with no model; never reports anomalous.
    pub fn disabled() -> Self {
        Self { model: None }
    }

    /// Train from the historical dataset, failing open on any error.
    pub fn train_from_csv(path: &Path, config: &ModelConfig) -> Self {
        match Self::try_train_from_csv(path, config) {
            Ok(detector) => detector,
            Err(e) => {
                warn!(
                    dataset = %path.display(),
                    error = %e,
                    "Anomaly model unavailable, detector will report nothing anomalous"
                );
                Self::disabled()
            }
        }
    }

    /// Train from the historical dataset, surfacing failures to the caller.
    pub fn try_train_from_csv(path: &Path, config: &ModelConfig) -> Result<Self, TrainingError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut points = Vec::new();
        for row in reader.deserialize() {
            let row: DatasetRow = row?;
            points.push([row.fuel_liters, row.bill_amount]);
        }
        Self::fit(&points, config)
    }

    /// Fit a forest over in-memory feature pairs and calibrate the
    /// score threshold at the `1 - contamination` quantile.
    pub fn fit(points: &[[f64; 2]], config: &ModelConfig) -> Result<Self, TrainingError> {
        if points.len() < MIN_TRAINING_ROWS {
            return Err(TrainingError::TooFewRows(points.len()));
        }

        let options = ForestOptions {
            n_trees: config.n_trees,
            sample_size: config.sample_size.min(points.len()),
            max_tree_depth: None,
            extension_level: 1,
        };
        let forest = Forest::from_slice(points, &options)
            .map_err(|e| TrainingError::Fit(format!("{e:?}")))?;

        let mut scores: Vec<f64> = points.iter().map(|p| forest.score(p)).collect();
        scores.sort_by(|a, b| a.total_cmp(b));
        let quantile = (1.0 - config.contamination).clamp(0.0, 1.0);
        let idx = ((scores.len() - 1) as f64 * quantile).round() as usize;
        let threshold = scores[idx];

        info!(
            rows = points.len(),
            n_trees = config.n_trees,
            threshold = threshold,
            "Anomaly model trained"
        );

        Ok(Self {
            model: Some(FittedModel { forest, threshold }),
        })
    }

    /// Whether a fitted model is loaded.
    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Score one transaction. Without a model this is always `false`.
    pub fn is_anomalous(&self, fuel_liters: f64, bill_amount: f64) -> bool {
        match &self.model {
            Some(model) => model.forest.score(&[fuel_liters, bill_amount]) > model.threshold,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::io::Write;

    fn training_points() -> Vec<[f64; 2]> {
        // Typical pump transactions: 5-15 L at roughly 100 per liter.
        (0..200)
            .map(|i| {
                let liters = 5.0 + (i % 100) as f64 * 0.1;
                let amount = liters * 100.0 + (i % 7) as f64;
                [liters, amount]
            })
            .collect()
    }

    #[test]
    fn test_disabled_detector_fails_open() {
        let detector = AnomalyDetector::disabled();
        assert!(!detector.is_ready());
        assert!(!detector.is_anomalous(10.0, 1000.0));
        assert!(!detector.is_anomalous(1.0e9, -5.0));
    }

    #[test]
    fn test_missing_dataset_fails_open() {
        let config = AppConfig::default().model;
        let detector =
            AnomalyDetector::train_from_csv(Path::new("/nonexistent/data.csv"), &config);
        assert!(!detector.is_ready());
        assert!(!detector.is_anomalous(1.0e6, 0.0));
    }

    #[test]
    fn test_too_few_rows_is_typed_error() {
        let config = AppConfig::default().model;
        let result = AnomalyDetector::fit(&[[1.0, 2.0]; 3], &config);
        assert!(matches!(result, Err(TrainingError::TooFewRows(3))));
    }

    #[test]
    fn test_typical_point_is_not_anomalous() {
        let config = AppConfig::default().model;
        let detector = AnomalyDetector::fit(&training_points(), &config).unwrap();
        assert!(detector.is_ready());
        assert!(!detector.is_anomalous(10.0, 1000.0));
    }

    #[test]
    fn test_extreme_point_is_anomalous() {
        let config = AppConfig::default().model;
        let detector = AnomalyDetector::fit(&training_points(), &config).unwrap();
        assert!(detector.is_anomalous(500.0, 50_000.0));
    }

    #[test]
    fn test_train_from_csv_roundtrip() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "FuelLiters,BillAmount").unwrap();
        for point in training_points() {
            writeln!(file, "{},{}", point[0], point[1]).unwrap();
        }

        let config = AppConfig::default().model;
        let detector = AnomalyDetector::train_from_csv(file.path(), &config);
        assert!(detector.is_ready());
        assert!(!detector.is_anomalous(10.0, 1000.0));
    }
}
