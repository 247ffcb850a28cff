//! Digits-only OCR for pump and meter readouts

use regex::Regex;
use rusty_tesseract::Args;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::{preprocess, recognize_with_timeout, OcrError};
use crate::config::OcrConfig;

/// Reads numeric values from digit-dominant imagery (meter displays).
///
/// Tesseract is restricted to digits and the decimal point, which cuts
/// down misreads on seven-segment style display fonts.
pub struct NumericReader {
    lang: String,
    timeout: Duration,
    number_pattern: Regex,
}

impl NumericReader {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            lang: config.lang.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            // Decimal forms first so "12.5" is not split into 12 and 5.
            number_pattern: Regex::new(r"[-+]?\d*\.\d+|\d+").expect("valid number pattern"),
        }
    }

    /// Recognize and parse every number visible in the image, in
    /// reading order. Empty on recognition failure is the caller's
    /// concern; this returns a typed error instead.
    pub fn read(&self, path: &Path) -> Result<Vec<f64>, OcrError> {
        let binarized = preprocess(path)?;

        let mut config_variables = HashMap::new();
        config_variables.insert(
            "tessedit_char_whitelist".to_string(),
            "0123456789.".to_string(),
        );
        let args = Args {
            lang: self.lang.clone(),
            dpi: Some(150),
            psm: Some(6),
            oem: Some(3),
            config_variables,
        };

        let text = recognize_with_timeout(binarized, args, self.timeout)?;
        Ok(self.parse_numbers(&text))
    }

    /// Pull integer and decimal literals out of recognized text.
    pub fn parse_numbers(&self, text: &str) -> Vec<f64> {
        self.number_pattern
            .find_iter(text)
            .filter_map(|m| m.as_str().parse::<f64>().ok())
            .collect()
    }
}
