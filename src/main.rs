//! Heart Disease Screening Service - Main Entry Point
//!
//! Consumes assessment requests from NATS, runs classifier inference, and
//! answers with structured risk reports.

use anyhow::Result;
use futures::StreamExt;
use heart_screening_service::{
    config::AppConfig, consumer::AssessmentConsumer, feature_extractor::FeatureExtractor,
    metrics::{MetricsReporter, ScreeningMetrics},
    models::predictor::Predictor,
    producer::ReportProducer,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Metadata answered on the info subject
#[derive(Serialize)]
struct ServiceInfo {
    service: &'static str,
    description: &'static str,
    model: String,
    has_probabilities: bool,
    feature_count: usize,
    features: Vec<&'static str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    match config.logging.format.as_str() {
        "json" => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    info!("Starting Heart Disease Screening Service");
    info!(
        "Risk levels: medium>={:.2}, high>={:.2}, critical>={:.2}",
        config.screening.risk_levels.medium,
        config.screening.risk_levels.high,
        config.screening.risk_levels.critical
    );

    // Initialize metrics
    let metrics = Arc::new(ScreeningMetrics::new());

    // Initialize components
    let feature_extractor = Arc::new(FeatureExtractor::new());
    info!(
        "Feature extractor initialized ({} features)",
        feature_extractor.feature_count()
    );

    // Load the classifier; a missing or corrupt model file halts startup
    let predictor = Arc::new(Predictor::new(&config)?);
    info!(
        model = %predictor.model_name(),
        probabilities = predictor.has_probabilities(),
        "Classifier loaded"
    );

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let consumer = AssessmentConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(ReportProducer::new(client.clone(), &config.nats.report_subject));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting assessment processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", config.nats.request_subject);
    info!("Publishing reports to: {}", config.nats.report_subject);

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Wrap config in Arc for sharing
    let config = Arc::new(config);

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Answer service metadata queries
    spawn_info_responder(
        client.clone(),
        config.nats.info_subject.clone(),
        config.model.path.clone(),
        predictor.clone(),
        feature_extractor.clone(),
    )
    .await?;

    // Process assessment requests
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await.unwrap();

        // Clone shared resources for the spawned task
        let feature_extractor = feature_extractor.clone();
        let predictor = predictor.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let config = config.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();
            let reply = message.reply.clone();

            let input = match serde_json::from_slice::<heart_screening_service::AssessmentInput>(
                &message.payload,
            ) {
                Ok(input) => input,
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize assessment request");
                    metrics.record_rejected();
                    if let Some(reply) = reply {
                        let _ = producer
                            .reply_error(reply, &format!("invalid request: {e}"))
                            .await;
                    }
                    drop(permit);
                    return;
                }
            };

            let assessment_id = input.assessment_id.clone();

            // Reject out-of-range measurements before they reach the model
            if let Err(e) = input.validate() {
                warn!(assessment_id = %assessment_id, error = %e, "Assessment rejected");
                metrics.record_rejected();
                if let Some(reply) = reply {
                    let _ = producer.reply_error(reply, &e).await;
                }
                drop(permit);
                return;
            }

            // Assemble the feature vector and run the classifier
            let features = feature_extractor.extract(&input);

            match predictor.predict(&features) {
                Ok(prediction) => {
                    let processing_time = start_time.elapsed();
                    let report = prediction.to_report(&input, &config.screening.risk_levels);

                    metrics.record_assessment(
                        processing_time,
                        prediction.label,
                        prediction.positive_probability(),
                    );
                    metrics.record_report(&format!("{:?}", report.risk_level).to_lowercase());

                    if let Some(reply) = reply {
                        if let Err(e) = producer.reply(reply, &report).await {
                            error!(
                                assessment_id = %assessment_id,
                                error = %e,
                                "Failed to reply with assessment report"
                            );
                        }
                    }

                    if let Err(e) = producer.publish(&report).await {
                        error!(
                            assessment_id = %assessment_id,
                            error = %e,
                            "Failed to publish assessment report"
                        );
                    } else {
                        debug!(
                            assessment_id = %assessment_id,
                            prediction = report.prediction,
                            risk_level = ?report.risk_level,
                            processing_time_us = processing_time.as_micros(),
                            "Assessment processed"
                        );
                    }

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

                    // Log progress every 100 assessments
                    if count % 100 == 0 {
                        let throughput = metrics.get_throughput();
                        let processing_stats = metrics.get_processing_stats();
                        info!(
                            processed = count,
                            throughput = format!("{:.1} /s", throughput),
                            avg_latency_us = processing_stats.mean_us,
                            positive_rate = format!("{:.1}%", metrics.get_positive_rate() * 100.0),
                            "Processing milestone"
                        );
                    }
                }
                Err(e) => {
                    error!(
                        assessment_id = %assessment_id,
                        error = %e,
                        "Inference failed"
                    );
                    if let Some(reply) = reply {
                        let _ = producer.reply_error(reply, "prediction failed").await;
                    }
                }
            }

            // Release permit when done
            drop(permit);
        });
    }

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

/// Subscribe to the info subject and answer metadata queries
async fn spawn_info_responder(
    client: async_nats::Client,
    subject: String,
    model_path: String,
    predictor: Arc<Predictor>,
    feature_extractor: Arc<FeatureExtractor>,
) -> Result<()> {
    let mut subscription = client.subscribe(subject.clone()).await?;
    info!(subject = %subject, "Answering service metadata queries");

    tokio::spawn(async move {
        while let Some(message) = subscription.next().await {
            let Some(reply) = message.reply else {
                continue;
            };

            let info = ServiceInfo {
                service: "heart-screening-service",
                description: "Screens manually entered medical measurements for \
                              heart disease risk using a pre-trained classifier",
                model: model_path.clone(),
                has_probabilities: predictor.has_probabilities(),
                feature_count: feature_extractor.feature_count(),
                features: feature_extractor.feature_names(),
            };

            match serde_json::to_vec(&info) {
                Ok(payload) => {
                    if let Err(e) = client.publish(reply, payload.into()).await {
                        warn!(error = %e, "Failed to answer info query");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to serialize service info"),
            }
        }
    });

    Ok(())
}
