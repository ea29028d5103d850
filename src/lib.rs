//! Heart Disease Screening Service Library
//!
//! Consumes assessment requests over NATS, runs a pre-trained binary
//! classifier loaded from an ONNX file, and produces structured risk reports.

pub mod config;
pub mod consumer;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod types;

pub use config::AppConfig;
pub use consumer::AssessmentConsumer;
pub use feature_extractor::FeatureExtractor;
pub use models::predictor::Predictor;
pub use producer::ReportProducer;
pub use types::{assessment::AssessmentInput, report::AssessmentReport};
