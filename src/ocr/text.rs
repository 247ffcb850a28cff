//! Full-text OCR and payment-screenshot heuristics

use rusty_tesseract::Args;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::{preprocess, recognize_with_timeout, OcrError};
use crate::config::OcrConfig;

/// Confirmation phrases expected on a genuine payment screenshot.
const CONFIRMATION_KEYWORDS: &[&str] = &["payment successful", "paid"];

/// Extracts free text from payment screenshots.
pub struct TextExtractor {
    lang: String,
    timeout: Duration,
}

/// Outcome of the screenshot heuristics.
#[derive(Debug, Clone)]
pub struct ScreenshotAnalysis {
    /// True when the confirmation keyword check failed
    pub suspicious: bool,
    /// Accumulated findings; may be non-empty even when not suspicious
    pub reasons: Vec<String>,
    /// Lowercase text the heuristics ran over
    pub extracted_text: String,
}

impl TextExtractor {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            lang: config.lang.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Recognize all text in the image, lowercased.
    pub fn extract(&self, path: &Path) -> Result<String, OcrError> {
        let binarized = preprocess(path)?;
        let args = Args {
            lang: self.lang.clone(),
            dpi: Some(150),
            psm: Some(3),
            oem: Some(3),
            config_variables: HashMap::new(),
        };
        let text = recognize_with_timeout(binarized, args, self.timeout)?;
        Ok(text.to_lowercase())
    }

    /// Apply the screenshot heuristics to already-extracted text.
    ///
    /// A missing confirmation keyword makes the screenshot suspicious. A
    /// missing amount substring is recorded as a reason only: it is
    /// advisory evidence, not a trigger. Empty text fails both checks,
    /// so an unreadable screenshot is flagged rather than silently passed.
    pub fn inspect(text: &str, claimed_amount: f64) -> ScreenshotAnalysis {
        let mut reasons = Vec::new();
        let mut suspicious = false;

        if !CONFIRMATION_KEYWORDS.iter().any(|kw| text.contains(kw)) {
            reasons.push("Missing 'Payment Successful' confirmation text.".to_string());
            suspicious = true;
        }

        let amount_literal = (claimed_amount.trunc() as i64).to_string();
        if !text.contains(&amount_literal) {
            reasons.push(format!(
                "Claimed amount {claimed_amount} not found clearly in screenshot."
            ));
        }

        ScreenshotAnalysis {
            suspicious,
            reasons,
            extracted_text: text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_keyword_present() {
        let analysis = TextExtractor::inspect("payment successful  rs 1000 to station", 1000.0);
        assert!(!analysis.suspicious);
        assert!(analysis.reasons.is_empty());
    }

    #[test]
    fn test_missing_keyword_is_suspicious() {
        let analysis = TextExtractor::inspect("transfer complete rs 1000", 1000.0);
        assert!(analysis.suspicious);
        assert_eq!(analysis.reasons.len(), 1);
    }

    #[test]
    fn test_missing_amount_alone_does_not_flag() {
        // Amount absence is advisory: it adds a reason but never flips
        // the suspicion flag on its own.
        let analysis = TextExtractor::inspect("payment successful to station", 1234.0);
        assert!(!analysis.suspicious);
        assert_eq!(analysis.reasons.len(), 1);
        assert!(analysis.reasons[0].contains("1234"));
    }

    #[test]
    fn test_amount_compared_as_truncated_integer() {
        let analysis = TextExtractor::inspect("paid 1030 ok", 1030.75);
        assert!(!analysis.suspicious);
        assert!(analysis.reasons.is_empty());
    }

    #[test]
    fn test_empty_text_fails_both_heuristics() {
        let analysis = TextExtractor::inspect("", 500.0);
        assert!(analysis.suspicious);
        assert_eq!(analysis.reasons.len(), 2);
    }
}
