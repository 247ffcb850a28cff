//! Performance metrics and statistics tracking for the analysis pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

use crate::types::Verdict;

/// Metrics collector for pipeline activity
pub struct PipelineMetrics {
    /// Total transactions analyzed
    pub transactions_analyzed: AtomicU64,
    /// Total fraud verdicts
    pub fraud_detected: AtomicU64,
    /// Fraud verdicts by category
    verdicts_by_type: RwLock<HashMap<String, u64>>,
    /// Analysis times (in microseconds)
    analysis_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            transactions_analyzed: AtomicU64::new(0),
            fraud_detected: AtomicU64::new(0),
            verdicts_by_type: RwLock::new(HashMap::new()),
            analysis_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record one completed analysis
    pub fn record_analysis(&self, elapsed: Duration, verdict: &Verdict) {
        self.transactions_analyzed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.analysis_times.write() {
            times.push(elapsed.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if verdict.is_fraud {
            self.fraud_detected.fetch_add(1, Ordering::Relaxed);
            if let Some(fraud_type) = verdict.fraud_type {
                if let Ok(mut by_type) = self.verdicts_by_type.write() {
                    *by_type.entry(format!("{:?}", fraud_type)).or_insert(0) += 1;
                }
            }
        }
    }

    /// Get analysis time statistics
    pub fn get_analysis_stats(&self) -> AnalysisStats {
        let times = self.analysis_times.read().unwrap();
        if times.is_empty() {
            return AnalysisStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        AnalysisStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (transactions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_analyzed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get fraud verdicts by category
    pub fn get_verdicts_by_type(&self) -> HashMap<String, u64> {
        self.verdicts_by_type.read().unwrap().clone()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let analyzed = self.transactions_analyzed.load(Ordering::Relaxed);
        let fraud = self.fraud_detected.load(Ordering::Relaxed);
        let fraud_rate = if analyzed > 0 {
            (fraud as f64 / analyzed as f64) * 100.0
        } else {
            0.0
        };
        let stats = self.get_analysis_stats();

        info!(
            analyzed = analyzed,
            fraud = fraud,
            fraud_rate = format!("{:.1}%", fraud_rate),
            throughput = format!("{:.1} tx/s", self.get_throughput()),
            "Pipeline summary"
        );
        info!(
            mean_us = stats.mean_us,
            p50_us = stats.p50_us,
            p95_us = stats.p95_us,
            p99_us = stats.p99_us,
            "Analysis time (us)"
        );
        for (fraud_type, count) in self.get_verdicts_by_type() {
            info!(fraud_type = %fraud_type, count = count, "Verdicts by type");
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Analysis time statistics
#[derive(Debug, Default)]
pub struct AnalysisStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FraudType;

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        let clean = Verdict::clean("TXN-1");
        let fraud = Verdict::fraud("TXN-2", FraudType::Duplicate, "Duplicate Transaction ID detected");

        metrics.record_analysis(Duration::from_micros(100), &clean);
        metrics.record_analysis(Duration::from_micros(200), &fraud);

        assert_eq!(metrics.transactions_analyzed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.fraud_detected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_verdicts_by_type().get("Duplicate"), Some(&1));
    }

    #[test]
    fn test_analysis_stats() {
        let metrics = PipelineMetrics::new();
        let clean = Verdict::clean("TXN-1");

        for us in [100u64, 200, 300, 400] {
            metrics.record_analysis(Duration::from_micros(us), &clean);
        }

        let stats = metrics.get_analysis_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
    }
}
