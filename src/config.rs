//! Configuration management for the screening service

use crate::types::report::RiskLevelThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    pub screening: ScreeningConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming assessment requests
    pub request_subject: String,
    /// Subject for outgoing assessment reports
    pub report_subject: String,
    /// Subject answering service metadata queries
    #[serde(default = "default_info_subject")]
    pub info_subject: String,
}

fn default_info_subject() -> String {
    "screening.info".to_string()
}

/// Classifier model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the serialized ONNX classifier
    pub path: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Positive-class cutoff used when the model exposes no label output
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_decision_threshold() -> f64 {
    0.5
}

/// Screening configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScreeningConfig {
    /// Risk level classification thresholds over the positive-class probability
    #[serde(default)]
    pub risk_levels: RiskLevelThresholds,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of assessments handled concurrently
    pub workers: usize,
    /// Processing timeout in milliseconds
    pub timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
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
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "screening.requests".to_string(),
                report_subject: "screening.reports".to_string(),
                info_subject: default_info_subject(),
            },
            model: ModelConfig {
                path: "models/heart_disease.onnx".to_string(),
                onnx_threads: 1,
                decision_threshold: 0.5,
            },
            screening: ScreeningConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                timeout_ms: 1000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
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
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.request_subject, "screening.requests");
        assert_eq!(config.model.path, "models/heart_disease.onnx");
        assert_eq!(config.model.decision_threshold, 0.5);
        assert_eq!(config.pipeline.workers, 4);
    }

    #[test]
    fn test_risk_level_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.screening.risk_levels.medium, 0.5);
        assert_eq!(config.screening.risk_levels.critical, 0.9);
    }
}
