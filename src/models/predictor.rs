//! Classifier invocation for screening assessments

use crate::config::AppConfig;
use crate::models::loader::{LoadedModel, ModelError, ModelLoader};
use crate::types::assessment::AssessmentInput;
use crate::types::report::{AssessmentReport, RiskLevel, RiskLevelThresholds};
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Result of one classifier invocation
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Predicted class (0 = no heart disease, 1 = heart disease)
    pub label: i64,
    /// Class probabilities `[negative, positive]`, when the model exposes them
    pub probabilities: Option<[f64; 2]>,
}

impl Prediction {
    /// Positive-class probability, when available
    pub fn positive_probability(&self) -> Option<f64> {
        self.probabilities.map(|p| p[1])
    }

    /// Build the report presented for this prediction
    pub fn to_report(
        &self,
        input: &AssessmentInput,
        risk_thresholds: &RiskLevelThresholds,
    ) -> AssessmentReport {
        let risk_level = match self.positive_probability() {
            Some(p) => RiskLevel::from_probability(p, risk_thresholds),
            None => RiskLevel::from_label(self.label),
        };

        let report = AssessmentReport::new(input.assessment_id.clone(), self.label, risk_level);
        match self.positive_probability() {
            Some(p) => report.with_probability(p),
            None => report,
        }
    }
}

/// Single-model inference engine using ONNX Runtime
pub struct Predictor {
    /// Loaded classifier (RwLock: the session requires `&mut` to run)
    model: RwLock<LoadedModel>,
    /// Positive-class cutoff when the export has no label output
    decision_threshold: f64,
}

impl Predictor {
    /// Create a predictor from configuration
    pub fn new(config: &AppConfig) -> Result<Self, ModelError> {
        let loader = ModelLoader::with_threads(config.model.onnx_threads)?;
        let model = loader.load_model(&config.model.path)?;

        Ok(Self {
            model: RwLock::new(model),
            decision_threshold: config.model.decision_threshold,
        })
    }

    /// Create a predictor for a specific model file
    pub fn from_path(path: &str, decision_threshold: f64) -> Result<Self, ModelError> {
        let loader = ModelLoader::new()?;
        let model = loader.load_model(path)?;

        Ok(Self {
            model: RwLock::new(model),
            decision_threshold,
        })
    }

    /// Get the loaded model name
    pub fn model_name(&self) -> String {
        self.model
            .read()
            .map(|m| m.name.clone())
            .unwrap_or_default()
    }

    /// Whether the loaded export carries a probability output
    pub fn has_probabilities(&self) -> bool {
        self.model
            .read()
            .map(|m| m.probability_output.is_some())
            .unwrap_or(false)
    }

    /// Run the classifier on an assembled feature vector.
    ///
    /// The label is required; probabilities are attached when the export
    /// provides them.
    pub fn predict(&self, features: &[f32]) -> Result<Prediction> {
        use ort::value::Tensor;

        let mut model = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let input_name = model.input_name.clone();
        let label_output = model.label_output.clone();
        let probability_output = model.probability_output.clone();
        let model_name = model.name.clone();

        let outputs = model
            .session
            .run(ort::inputs![&input_name => input_tensor])
            .context("Classifier invocation failed")?;

        let probabilities = match probability_output.as_deref() {
            Some(name) => self.extract_probabilities(&outputs, name, &model_name),
            None => None,
        };

        let label = match self.extract_label(&outputs, &label_output) {
            Some(label) => label,
            None => {
                // No usable label output: fall back to thresholding the
                // positive-class probability.
                let positive = probabilities
                    .map(|p| p[1])
                    .context("Model produced neither a label nor probabilities")?;
                i64::from(positive >= self.decision_threshold)
            }
        };

        debug!(
            model = %model_name,
            label = label,
            probabilities = ?probabilities,
            "Inference complete"
        );

        Ok(Prediction {
            label,
            probabilities,
        })
    }

    /// Extract the predicted class from the label output
    fn extract_label(&self, outputs: &ort::session::SessionOutputs, label_output: &str) -> Option<i64> {
        let output = outputs.get(label_output)?;

        if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            return data.first().copied();
        }

        // Some exports emit the label as a float tensor
        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            return data.first().map(|&v| i64::from(v >= 0.5));
        }

        None
    }

    /// Extract class probabilities from the model output.
    ///
    /// Handles both tensor outputs and the `seq(map(int64, float32))` layout
    /// emitted by scikit-learn's ZipMap and by CatBoost/LightGBM exporters.
    fn extract_probabilities(
        &self,
        outputs: &ort::session::SessionOutputs,
        output_name: &str,
        model_name: &str,
    ) -> Option<[f64; 2]> {
        let output = outputs.get(output_name)?;
        let dtype = output.dtype();

        // Tensor format: [1, 2] class probabilities
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let num_classes = *dims.last().unwrap_or(&0) as usize;
            if num_classes >= 2 && data.len() >= 2 {
                debug!(model = %model_name, "Extracted probabilities from tensor");
                return Some([data[0] as f64, data[1] as f64]);
            }
            if num_classes == 1 {
                // Single positive-class probability
                let p = data[0] as f64;
                return Some([1.0 - p, p]);
            }
        }

        // Sequence format: seq(map(int64, float32))
        if DynSequenceValueType::can_downcast(&dtype) {
            match self.extract_from_sequence_map(output, model_name) {
                Ok(probs) => return Some(probs),
                Err(e) => {
                    warn!(model = %model_name, error = %e, "Failed to extract probability map");
                }
            }
        }

        warn!(model = %model_name, output = %output_name, "Probability output present but unreadable");
        None
    }

    /// Extract probabilities from the `seq(map(int64, float32))` layout
    fn extract_from_sequence_map(
        &self,
        output: &ort::value::DynValue,
        model_name: &str,
    ) -> Result<[f64; 2]> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

        if maps.is_empty() {
            anyhow::bail!("Empty probability sequence");
        }

        // Batch size is 1; the first map carries class_id -> probability
        let kv_pairs = maps[0].try_extract_key_values::<i64, f32>()?;

        let mut probs = [f64::NAN; 2];
        for (class_id, prob) in &kv_pairs {
            if *class_id == 0 || *class_id == 1 {
                probs[*class_id as usize] = *prob as f64;
            }
        }

        if probs[1].is_nan() {
            anyhow::bail!("No positive-class probability found in map");
        }
        if probs[0].is_nan() {
            probs[0] = 1.0 - probs[1];
        }

        debug!(model = %model_name, probs = ?probs, "Extracted probabilities from seq(map)");
        Ok(probs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_positive_probability() {
        let prediction = Prediction {
            label: 1,
            probabilities: Some([0.22, 0.78]),
        };

        assert_eq!(prediction.positive_probability(), Some(0.78));
    }

    #[test]
    fn test_prediction_without_probabilities() {
        let prediction = Prediction {
            label: 0,
            probabilities: None,
        };

        assert_eq!(prediction.positive_probability(), None);
    }

    #[test]
    fn test_to_report_with_probabilities() {
        let input = AssessmentInput::new("assess_42".to_string(), 58);
        let prediction = Prediction {
            label: 1,
            probabilities: Some([0.08, 0.92]),
        };

        let report = prediction.to_report(&input, &RiskLevelThresholds::default());

        assert_eq!(report.assessment_id, "assess_42");
        assert_eq!(report.prediction, 1);
        assert!(report.positive);
        assert_eq!(report.probability, Some(0.92));
        assert_eq!(report.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_to_report_degrades_without_probabilities() {
        let input = AssessmentInput::new("assess_43".to_string(), 47);
        let prediction = Prediction {
            label: 0,
            probabilities: None,
        };

        let report = prediction.to_report(&input, &RiskLevelThresholds::default());

        assert_eq!(report.prediction, 0);
        assert!(report.probability.is_none());
        assert_eq!(report.risk_level, RiskLevel::Low);
    }
}
