//! Configuration management for the fraud analysis pipeline

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub pump: PumpConfig,
    pub forensics: ForensicsConfig,
    pub ocr: OcrConfig,
    pub model: ModelConfig,
    pub logging: LoggingConfig,
}

/// Price-consistency check configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Price per liter used to compute the expected bill
    #[serde(default = "default_unit_price")]
    pub unit_price: f64,
    /// Relative tolerance on the expected price (0.05 = 5%)
    #[serde(default = "default_price_tolerance")]
    pub tolerance: f64,
}

/// Pump-photo cross-check configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PumpConfig {
    /// Absolute tolerance (liters) between a meter reading and the claim
    #[serde(default = "default_reading_tolerance")]
    pub reading_tolerance: f64,
}

/// Error-level-analysis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ForensicsConfig {
    /// JPEG quality used for the recompression pass (0-100)
    #[serde(default = "default_recompress_quality")]
    pub recompress_quality: u8,
    /// Directory where evidence artifacts are written by the binary
    #[serde(default = "default_evidence_dir")]
    pub evidence_dir: String,
}

/// OCR configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language pack
    #[serde(default = "default_ocr_lang")]
    pub lang: String,
    /// Upper bound on a single recognition pass, in milliseconds
    #[serde(default = "default_ocr_timeout_ms")]
    pub timeout_ms: u64,
}

/// Anomaly model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// CSV dataset of historical (FuelLiters, BillAmount) rows
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
    /// Expected fraction of outliers in the training data
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    /// Number of trees in the isolation forest
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    /// Samples drawn per tree (clamped to the dataset size)
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_unit_price() -> f64 {
    100.0
}

fn default_price_tolerance() -> f64 {
    0.05
}

fn default_reading_tolerance() -> f64 {
    0.5
}

fn default_recompress_quality() -> u8 {
    90
}

fn default_evidence_dir() -> String {
    "media/ela_evidence".to_string()
}

fn default_ocr_lang() -> String {
    "eng".to_string()
}

fn default_ocr_timeout_ms() -> u64 {
    10_000
}

fn default_dataset_path() -> String {
    "datasets/transaction_data.csv".to_string()
}

fn default_contamination() -> f64 {
    0.05
}

fn default_n_trees() -> usize {
    150
}

fn default_sample_size() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig {
                unit_price: default_unit_price(),
                tolerance: default_price_tolerance(),
            },
            pump: PumpConfig {
                reading_tolerance: default_reading_tolerance(),
            },
            forensics: ForensicsConfig {
                recompress_quality: default_recompress_quality(),
                evidence_dir: default_evidence_dir(),
            },
            ocr: OcrConfig {
                lang: default_ocr_lang(),
                timeout_ms: default_ocr_timeout_ms(),
            },
            model: ModelConfig {
                dataset_path: default_dataset_path(),
                contamination: default_contamination(),
                n_trees: default_n_trees(),
                sample_size: default_sample_size(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.pricing.unit_price, 100.0);
        assert_eq!(config.pricing.tolerance, 0.05);
        assert_eq!(config.pump.reading_tolerance, 0.5);
        assert_eq!(config.forensics.recompress_quality, 90);
        assert_eq!(config.model.contamination, 0.05);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        use std::io::Write;

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[pricing]\nunit_price = 95.0").unwrap();
        writeln!(
            file,
            "[pump]\n[forensics]\n[ocr]\n[model]\n[logging]"
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.pricing.unit_price, 95.0);
        assert_eq!(config.pricing.tolerance, 0.05);
        assert_eq!(config.ocr.lang, "eng");
    }
}
