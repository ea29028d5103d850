//! Test Assessment Requester
//!
//! Generates and submits test assessments to NATS for service testing.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Assessment structure matching the service's expected format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AssessmentInput {
    assessment_id: String,
    age: i32,
    sex: i32,
    cp: i32,
    trestbps: f64,
    chol: f64,
    fbs: i32,
    restecg: i32,
    thalach: f64,
    exang: i32,
    oldpeak: f64,
    slope: i32,
    ca: i32,
    thal: i32,
    timestamp: chrono::DateTime<Utc>,
}

/// Assessment generator for testing
struct AssessmentGenerator {
    rng: rand::rngs::ThreadRng,
    assessment_counter: u64,
}

impl AssessmentGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            assessment_counter: 0,
        }
    }

    /// Generate a plausible low-risk patient profile
    fn generate_low_risk(&mut self) -> AssessmentInput {
        self.assessment_counter += 1;

        AssessmentInput {
            assessment_id: format!("assess_{:012}", self.assessment_counter),
            age: self.rng.gen_range(29..50),
            sex: self.rng.gen_range(0..=1),
            cp: self.rng.gen_range(0..=1),
            trestbps: self.rng.gen_range(100.0..130.0),
            chol: self.rng.gen_range(150.0..220.0),
            fbs: 0,
            restecg: 0,
            thalach: self.rng.gen_range(150.0..200.0),
            exang: 0,
            oldpeak: self.rng.gen_range(0.0..1.0),
            slope: self.rng.gen_range(0..=1),
            ca: 0,
            thal: self.rng.gen_range(0..=1),
            timestamp: Utc::now(),
        }
    }

    /// Generate a high-risk patient profile
    fn generate_high_risk(&mut self) -> AssessmentInput {
        self.assessment_counter += 1;

        AssessmentInput {
            assessment_id: format!("assess_{:012}", self.assessment_counter),
            age: self.rng.gen_range(55..78),        // Older patients
            sex: 1,
            cp: self.rng.gen_range(2..=3),          // Atypical chest pain
            trestbps: self.rng.gen_range(140.0..200.0), // Hypertensive
            chol: self.rng.gen_range(240.0..400.0), // High cholesterol
            fbs: self.rng.gen_range(0..=1),
            restecg: self.rng.gen_range(1..=2),     // Abnormal ECG
            thalach: self.rng.gen_range(90.0..130.0), // Low max heart rate
            exang: 1,                               // Exercise-induced angina
            oldpeak: self.rng.gen_range(2.0..5.0),  // Marked ST depression
            slope: self.rng.gen_range(1..=2),
            ca: self.rng.gen_range(1..=3),          // Affected vessels
            thal: self.rng.gen_range(2..=3),
            timestamp: Utc::now(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_requester=info".parse()?),
        )
        .init();

    info!("Starting Test Assessment Requester");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("screening.requests");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let high_risk_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.3);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        high_risk_rate = high_risk_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, high_risk_rate, delay_ms).await;
        }
    };

    // Generate and submit assessments
    let mut generator = AssessmentGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to submit {} assessments...", count);

    let mut low_risk_count = 0;
    let mut high_risk_count = 0;
    let mut answered = 0;

    for i in 0..count {
        let assessment = if rng.gen_bool(high_risk_rate) {
            high_risk_count += 1;
            generator.generate_high_risk()
        } else {
            low_risk_count += 1;
            generator.generate_low_risk()
        };

        let payload = serde_json::to_vec(&assessment)?;

        // Request/reply: one submission, one report
        match tokio::time::timeout(
            Duration::from_secs(2),
            client.request(subject.to_string(), payload.into()),
        )
        .await
        {
            Ok(Ok(reply)) => {
                answered += 1;
                info!(
                    assessment_id = %assessment.assessment_id,
                    report = %String::from_utf8_lossy(&reply.payload),
                    "Received report"
                );
            }
            Ok(Err(e)) => {
                warn!(
                    assessment_id = %assessment.assessment_id,
                    error = %e,
                    "Request failed"
                );
            }
            Err(_) => {
                warn!(
                    assessment_id = %assessment.assessment_id,
                    "No report within timeout"
                );
            }
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Submitted {}/{} assessments ({} low-risk, {} high-risk, {} answered)",
                i + 1,
                count,
                low_risk_count,
                high_risk_count,
                answered
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Submitted {} assessments ({} low-risk, {} high-risk, {} answered)",
        count, low_risk_count, high_risk_count, answered
    );

    Ok(())
}

async fn run_dry_mode(count: u64, high_risk_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = AssessmentGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let assessment = if rng.gen_bool(high_risk_rate) {
            generator.generate_high_risk()
        } else {
            generator.generate_low_risk()
        };

        let json = serde_json::to_string_pretty(&assessment)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample assessment {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
