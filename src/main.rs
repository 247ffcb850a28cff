//! PetrolGuard - Main Entry Point
//!
//! Trains the anomaly model from the historical dataset, then analyzes a
//! transaction record read from a JSON file and prints the verdict.

use anyhow::{Context, Result};
use petrolguard::{
    anomaly::AnomalyDetector, config::AppConfig, engine::DecisionEngine,
    metrics::PipelineMetrics, types::TransactionRecord,
};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("petrolguard=info".parse()?),
        )
        .init();

    info!("Starting PetrolGuard analysis pipeline");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");
    info!(
        "Unit price: {:.2}, price tolerance: {:.0}%, pump tolerance: {} L",
        config.pricing.unit_price,
        config.pricing.tolerance * 100.0,
        config.pump.reading_tolerance
    );

    let mut args = std::env::args().skip(1);
    let record_path = args
        .next()
        .context("usage: petrolguard <transaction.json> [history-ids.txt]")?;
    let history_path = args.next();

    // Train the anomaly model (fails open when the dataset is absent)
    let detector = AnomalyDetector::train_from_csv(Path::new(&config.model.dataset_path), &config.model);
    if detector.is_ready() {
        info!(dataset = %config.model.dataset_path, "Anomaly model ready");
    } else {
        warn!("Running without an anomaly model");
    }

    let engine = DecisionEngine::new(&config, detector);
    let metrics = PipelineMetrics::new();

    // Load the record and the known transaction ids
    let record: TransactionRecord = serde_json::from_str(
        &std::fs::read_to_string(&record_path)
            .with_context(|| format!("Failed to read {record_path}"))?,
    )
    .context("Failed to parse transaction record")?;

    let history: HashSet<String> = match &history_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {path}"))?
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect(),
        None => HashSet::new(),
    };
    info!(
        transaction_id = %record.transaction_id,
        known_ids = history.len(),
        "Analyzing transaction"
    );

    let start = Instant::now();
    let output = engine.analyze(&record, &history);
    metrics.record_analysis(start.elapsed(), &output.verdict);

    // Persist the forensic artifact; the pipeline itself only hands back
    // the buffer.
    if let Some(report) = &output.evidence {
        let path = report.write_to(Path::new(&config.forensics.evidence_dir))?;
        info!(artifact = %path.display(), "Evidence artifact written");
    }

    println!("{}", serde_json::to_string_pretty(&output.verdict)?);

    metrics.print_summary();
    Ok(())
}
