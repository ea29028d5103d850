//! Performance metrics and statistics tracking for the screening service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for screening throughput and outcomes
pub struct ScreeningMetrics {
    /// Total assessments processed
    pub assessments_processed: AtomicU64,
    /// Assessments predicted positive
    pub positive_predictions: AtomicU64,
    /// Requests rejected before inference (invalid or undecodable)
    pub rejected_requests: AtomicU64,
    /// Reports by risk level
    reports_by_level: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Positive-class probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ScreeningMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            assessments_processed: AtomicU64::new(0),
            positive_predictions: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
            reports_by_level: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a processed assessment
    pub fn record_assessment(
        &self,
        processing_time: Duration,
        label: i64,
        probability: Option<f64>,
    ) {
        self.assessments_processed.fetch_add(1, Ordering::Relaxed);
        if label == 1 {
            self.positive_predictions.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Some(p) = probability {
            let bucket = (p * 10.0).min(9.0) as usize;
            if let Ok(mut buckets) = self.probability_buckets.write() {
                buckets[bucket] += 1;
            }
        }
    }

    /// Record a report by its risk level
    pub fn record_report(&self, risk_level: &str) {
        if let Ok(mut by_level) = self.reports_by_level.write() {
            *by_level.entry(risk_level.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a request rejected before inference
    pub fn record_rejected(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (assessments per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.assessments_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get the share of positive predictions
    pub fn get_positive_rate(&self) -> f64 {
        let total = self.assessments_processed.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.positive_predictions.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Get probability distribution
    pub fn get_probability_distribution(&self) -> [u64; 10] {
        *self.probability_buckets.read().unwrap()
    }

    /// Get reports by risk level
    pub fn get_reports_by_level(&self) -> HashMap<String, u64> {
        self.reports_by_level.read().unwrap().clone()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let assessed = self.assessments_processed.load(Ordering::Relaxed);
        let positive = self.positive_predictions.load(Ordering::Relaxed);
        let rejected = self.rejected_requests.load(Ordering::Relaxed);
        let positive_rate = self.get_positive_rate() * 100.0;

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let reports_by_level = self.get_reports_by_level();
        let prob_dist = self.get_probability_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          HEART SCREENING SERVICE - METRICS SUMMARY           ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Assessments Processed:  {:>8}  │  Throughput: {:>6.1} /s   ║",
            assessed, throughput
        );
        info!(
            "║ Positive Predictions:   {:>8}  │  Positive:  {:>6.1}%     ║",
            positive, positive_rate
        );
        info!("║ Rejected Requests:      {:>8}                              ║", rejected);
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Reports by Risk Level:                                       ║");
        for (level, count) in &reports_by_level {
            let pct = if assessed > 0 {
                (*count as f64 / assessed as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:10}: {:>6} ({:>5.1}%)                                ║", level, count, pct);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Positive-Class Probability Distribution:                     ║");
        let total: u64 = prob_dist.iter().sum();
        for (i, &count) in prob_dist.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ScreeningMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<ScreeningMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<ScreeningMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ScreeningMetrics::new();

        metrics.record_assessment(Duration::from_micros(100), 1, Some(0.8));
        metrics.record_assessment(Duration::from_micros(200), 0, Some(0.2));
        metrics.record_report("high");
        metrics.record_report("low");

        assert_eq!(metrics.assessments_processed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.positive_predictions.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_reports_by_level().len(), 2);
    }

    #[test]
    fn test_positive_rate() {
        let metrics = ScreeningMetrics::new();

        metrics.record_assessment(Duration::from_micros(100), 1, None);
        metrics.record_assessment(Duration::from_micros(100), 1, None);
        metrics.record_assessment(Duration::from_micros(100), 0, None);
        metrics.record_assessment(Duration::from_micros(100), 0, None);

        assert!((metrics.get_positive_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_probability_buckets() {
        let metrics = ScreeningMetrics::new();

        metrics.record_assessment(Duration::from_micros(100), 1, Some(0.95));
        metrics.record_assessment(Duration::from_micros(100), 0, Some(0.05));
        metrics.record_assessment(Duration::from_micros(100), 0, None);

        let dist = metrics.get_probability_distribution();
        assert_eq!(dist[9], 1);
        assert_eq!(dist[0], 1);
        assert_eq!(dist.iter().sum::<u64>(), 2);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ScreeningMetrics::new();

        for us in [100_u64, 200, 300, 400] {
            metrics.record_assessment(Duration::from_micros(us), 0, None);
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
    }
}
