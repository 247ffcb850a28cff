//! Transaction record submitted for fraud analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single fuel transaction as recorded by the pump-station operator.
///
/// Immutable input to the pipeline: the engine reads it, never writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique transaction identifier (must not repeat across history)
    pub transaction_id: String,

    /// Customer name as entered by staff
    pub customer_name: String,

    /// Vehicle registration number
    pub vehicle_number: String,

    /// Claimed fuel volume in liters (non-negative)
    pub fuel_liters: f64,

    /// Claimed bill amount (non-negative)
    pub bill_amount: f64,

    /// Payment-confirmation screenshot, if supplied
    #[serde(default)]
    pub payment_screenshot: Option<PathBuf>,

    /// Pump/meter photograph, if supplied
    #[serde(default)]
    pub pump_image: Option<PathBuf>,

    /// Time the record was created
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create a record with the required fields and no evidence images.
    pub fn new(
        transaction_id: impl Into<String>,
        customer_name: impl Into<String>,
        vehicle_number: impl Into<String>,
        fuel_liters: f64,
        bill_amount: f64,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            customer_name: customer_name.into(),
            vehicle_number: vehicle_number.into(),
            fuel_liters,
            bill_amount,
            payment_screenshot: None,
            pump_image: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a payment screenshot path.
    pub fn with_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.payment_screenshot = Some(path.into());
        self
    }

    /// Attach a pump/meter photograph path.
    pub fn with_pump_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.pump_image = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization() {
        let record = TransactionRecord::new("TXN-001", "A. Kumar", "KA01AB1234", 10.0, 1000.0);

        let json = serde_json::to_string(&record).unwrap();
        let deserialized: TransactionRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(record.transaction_id, deserialized.transaction_id);
        assert_eq!(record.fuel_liters, deserialized.fuel_liters);
        assert!(deserialized.payment_screenshot.is_none());
    }

    #[test]
    fn test_optional_images_default_to_none() {
        let json = r#"{
            "transaction_id": "TXN-002",
            "customer_name": "B. Singh",
            "vehicle_number": "MH12CD5678",
            "fuel_liters": 5.5,
            "bill_amount": 550.0
        }"#;
        let record: TransactionRecord = serde_json::from_str(json).unwrap();
        assert!(record.payment_screenshot.is_none());
        assert!(record.pump_image.is_none());
    }
}
