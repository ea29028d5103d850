//! Assessment input for heart disease screening

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One patient's measurements submitted for screening.
///
/// Field meanings and value ranges follow the classifier's training data;
/// `validate` enforces the same bounds the intake form applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentInput {
    /// Unique assessment identifier
    #[serde(alias = "ID")]
    pub assessment_id: String,

    /// Age in years
    pub age: i32,

    /// Sex (0 = female, 1 = male)
    pub sex: i32,

    /// Chest pain type (0-3)
    pub cp: i32,

    /// Resting blood pressure (mm Hg)
    pub trestbps: f64,

    /// Serum cholesterol (mg/dl)
    pub chol: f64,

    /// Fasting blood sugar > 120 mg/dl (0 = no, 1 = yes)
    pub fbs: i32,

    /// Resting electrocardiographic result (0-2)
    pub restecg: i32,

    /// Maximum heart rate achieved
    pub thalach: f64,

    /// Exercise-induced angina (0 = no, 1 = yes)
    pub exang: i32,

    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,

    /// Slope of the peak exercise ST segment (0-2)
    pub slope: i32,

    /// Number of major vessels colored by fluoroscopy (0-3)
    pub ca: i32,

    /// Thalassemia class (0-3)
    pub thal: i32,

    /// Timestamp (optional, for request tracing)
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl AssessmentInput {
    /// Create a new assessment with typical in-range values
    pub fn new(assessment_id: String, age: i32) -> Self {
        Self {
            assessment_id,
            age,
            sex: 0,
            cp: 0,
            trestbps: 120.0,
            chol: 200.0,
            fbs: 0,
            restecg: 0,
            thalach: 150.0,
            exang: 0,
            oldpeak: 0.0,
            slope: 0,
            ca: 0,
            thal: 0,
            timestamp: Utc::now(),
        }
    }

    /// Check every field against its admissible range.
    ///
    /// Returns the first violation, naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.age < 0 {
            return Err(format!("age must be non-negative (value: {})", self.age));
        }
        if !(0..=1).contains(&self.sex) {
            return Err(format!("sex must be 0 or 1 (value: {})", self.sex));
        }
        if !(0..=3).contains(&self.cp) {
            return Err(format!("cp must be between 0 and 3 (value: {})", self.cp));
        }
        if self.trestbps < 0.0 {
            return Err(format!(
                "trestbps must be non-negative (value: {})",
                self.trestbps
            ));
        }
        if self.chol < 0.0 {
            return Err(format!("chol must be non-negative (value: {})", self.chol));
        }
        if !(0..=1).contains(&self.fbs) {
            return Err(format!("fbs must be 0 or 1 (value: {})", self.fbs));
        }
        if !(0..=2).contains(&self.restecg) {
            return Err(format!(
                "restecg must be between 0 and 2 (value: {})",
                self.restecg
            ));
        }
        if self.thalach < 0.0 {
            return Err(format!(
                "thalach must be non-negative (value: {})",
                self.thalach
            ));
        }
        if !(0..=1).contains(&self.exang) {
            return Err(format!("exang must be 0 or 1 (value: {})", self.exang));
        }
        if self.oldpeak < 0.0 {
            return Err(format!(
                "oldpeak must be non-negative (value: {})",
                self.oldpeak
            ));
        }
        if !(0..=2).contains(&self.slope) {
            return Err(format!(
                "slope must be between 0 and 2 (value: {})",
                self.slope
            ));
        }
        if !(0..=3).contains(&self.ca) {
            return Err(format!("ca must be between 0 and 3 (value: {})", self.ca));
        }
        if !(0..=3).contains(&self.thal) {
            return Err(format!(
                "thal must be between 0 and 3 (value: {})",
                self.thal
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assessment_serialization() {
        let input = AssessmentInput::new("assess_123".to_string(), 54);

        let json = serde_json::to_string(&input).unwrap();
        let deserialized: AssessmentInput = serde_json::from_str(&json).unwrap();

        assert_eq!(input.assessment_id, deserialized.assessment_id);
        assert_eq!(input.age, deserialized.age);
        assert_eq!(input.chol, deserialized.chol);
    }

    #[test]
    fn test_timestamp_defaults_on_deserialize() {
        let json = r#"{
            "assessment_id": "assess_001",
            "age": 61, "sex": 1, "cp": 2, "trestbps": 140.0, "chol": 240.0,
            "fbs": 1, "restecg": 1, "thalach": 130.0, "exang": 1,
            "oldpeak": 2.5, "slope": 1, "ca": 2, "thal": 3
        }"#;

        let input: AssessmentInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.assessment_id, "assess_001");
        assert_eq!(input.thal, 3);
    }

    #[test]
    fn test_validate_in_range() {
        let input = AssessmentInput::new("assess_ok".to_string(), 45);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut input = AssessmentInput::new("assess_bad".to_string(), 45);
        input.cp = 4;
        let err = input.validate().unwrap_err();
        assert!(err.contains("cp"));

        let mut input = AssessmentInput::new("assess_bad".to_string(), 45);
        input.oldpeak = -1.0;
        let err = input.validate().unwrap_err();
        assert!(err.contains("oldpeak"));

        let input = AssessmentInput::new("assess_bad".to_string(), -1);
        let err = input.validate().unwrap_err();
        assert!(err.contains("age"));
    }
}
