//! NATS message producer for assessment reports

use crate::types::report::AssessmentReport;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Producer for publishing assessment reports to NATS
#[derive(Clone)]
pub struct ReportProducer {
    client: Client,
    subject: String,
}

impl ReportProducer {
    /// Create a new report producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a report on the reports subject
    pub async fn publish(&self, report: &AssessmentReport) -> Result<()> {
        let payload = serde_json::to_vec(report)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            report_id = %report.report_id,
            assessment_id = %report.assessment_id,
            prediction = report.prediction,
            "Published assessment report"
        );

        Ok(())
    }

    /// Send a report to a request's reply inbox
    pub async fn reply(&self, reply_subject: Subject, report: &AssessmentReport) -> Result<()> {
        let payload = serde_json::to_vec(report)?;

        self.client.publish(reply_subject, payload.into()).await?;

        debug!(
            report_id = %report.report_id,
            assessment_id = %report.assessment_id,
            "Replied with assessment report"
        );

        Ok(())
    }

    /// Send an error payload to a request's reply inbox
    pub async fn reply_error(&self, reply_subject: Subject, message: &str) -> Result<()> {
        let payload = serde_json::to_vec(&serde_json::json!({ "error": message }))?;
        self.client.publish(reply_subject, payload.into()).await?;
        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}
