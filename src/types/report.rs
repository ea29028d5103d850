//! Assessment report data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Determine risk level from the positive-class probability
    pub fn from_probability(probability: f64, thresholds: &RiskLevelThresholds) -> Self {
        if probability >= thresholds.critical {
            RiskLevel::Critical
        } else if probability >= thresholds.high {
            RiskLevel::High
        } else if probability >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Degraded classification when the classifier exposes no probabilities:
    /// only the predicted class is known.
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }
}

/// Configurable risk level thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            low: 0.3,
            medium: 0.5,
            high: 0.7,
            critical: 0.9,
        }
    }
}

/// Risk summary shown for a positive prediction
pub const POSITIVE_SUMMARY: &str =
    "The submitted measurements are consistent with the presence of heart disease";

/// Risk summary shown for a negative prediction
pub const NEGATIVE_SUMMARY: &str =
    "The submitted measurements show no indication of heart disease";

/// Static follow-up advice for the predicted class
pub fn recommendations_for(label: i64) -> Vec<String> {
    let texts: &[&str] = if label == 1 {
        &[
            "Consult a cardiologist for a full diagnostic work-up",
            "Review blood pressure and cholesterol management with a physician",
            "Avoid strenuous exercise until cleared by a specialist",
        ]
    } else {
        &[
            "Maintain regular physical activity and a balanced diet",
            "Continue routine check-ups and periodic screening",
        ]
    };
    texts.iter().map(|s| s.to_string()).collect()
}

/// Report produced for one screening assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// Unique report identifier
    pub report_id: String,

    /// Associated assessment ID
    pub assessment_id: String,

    /// Predicted class (0 = no heart disease, 1 = heart disease)
    pub prediction: i64,

    /// Whether the prediction is the positive class
    pub positive: bool,

    /// Positive-class probability, when the classifier provides one
    pub probability: Option<f64>,

    /// Risk level classification
    pub risk_level: RiskLevel,

    /// Human-readable risk summary
    pub summary: String,

    /// Static follow-up advice for the predicted class
    pub recommendations: Vec<String>,

    /// Report generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl AssessmentReport {
    /// Create a new report for a predicted class
    pub fn new(assessment_id: String, prediction: i64, risk_level: RiskLevel) -> Self {
        let positive = prediction == 1;
        let summary = if positive {
            POSITIVE_SUMMARY.to_string()
        } else {
            NEGATIVE_SUMMARY.to_string()
        };

        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            assessment_id,
            prediction,
            positive,
            probability: None,
            risk_level,
            summary,
            recommendations: recommendations_for(prediction),
            timestamp: Utc::now(),
        }
    }

    /// Attach the positive-class probability
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_probability() {
        let thresholds = RiskLevelThresholds::default();

        assert_eq!(
            RiskLevel::from_probability(0.1, &thresholds),
            RiskLevel::Low
        );
        assert_eq!(
            RiskLevel::from_probability(0.5, &thresholds),
            RiskLevel::Medium
        );
        assert_eq!(
            RiskLevel::from_probability(0.75, &thresholds),
            RiskLevel::High
        );
        assert_eq!(
            RiskLevel::from_probability(0.95, &thresholds),
            RiskLevel::Critical
        );
    }

    #[test]
    fn test_risk_level_from_label() {
        assert_eq!(RiskLevel::from_label(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_label(1), RiskLevel::High);
    }

    #[test]
    fn test_report_summary_mapping() {
        let positive = AssessmentReport::new("a_1".to_string(), 1, RiskLevel::High);
        assert!(positive.positive);
        assert_eq!(positive.summary, POSITIVE_SUMMARY);
        assert_eq!(positive.recommendations.len(), 3);

        let negative = AssessmentReport::new("a_2".to_string(), 0, RiskLevel::Low);
        assert!(!negative.positive);
        assert_eq!(negative.summary, NEGATIVE_SUMMARY);
        assert_eq!(negative.recommendations.len(), 2);
    }

    #[test]
    fn test_report_serialization() {
        let report = AssessmentReport::new("assess_123".to_string(), 1, RiskLevel::Critical)
            .with_probability(0.93);

        let json = serde_json::to_string(&report).unwrap();
        let deserialized: AssessmentReport = serde_json::from_str(&json).unwrap();

        assert_eq!(report.assessment_id, deserialized.assessment_id);
        assert_eq!(report.prediction, deserialized.prediction);
        assert_eq!(report.risk_level, deserialized.risk_level);
        assert_eq!(deserialized.probability, Some(0.93));
    }
}
