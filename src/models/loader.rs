//! ONNX classifier loader

use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors surfaced while loading the serialized classifier
#[derive(Error, Debug)]
pub enum ModelError {
    /// The configured model file does not exist
    #[error("model file not found: {path}")]
    NotFound { path: PathBuf },

    /// The file exists but a session could not be built from it
    #[error("failed to load model from {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// ONNX Runtime could not be initialized
    #[error("ONNX Runtime initialization failed")]
    Init(#[source] ort::Error),
}

/// Loaded classifier with resolved graph names
#[derive(Debug)]
pub struct LoadedModel {
    /// Model name (file stem)
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the feature tensor
    pub input_name: String,
    /// Output carrying the predicted class label
    pub label_output: String,
    /// Output carrying class probabilities, absent for exports without one
    pub probability_output: Option<String>,
}

/// Loader for the serialized classifier
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self, ModelError> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self, ModelError> {
        ort::init().commit().map_err(ModelError::Init)?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load the classifier from file.
    ///
    /// Resolves the input tensor name, the label output, and the probability
    /// output. Classifier exports without a probability head leave the latter
    /// as `None`.
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel, ModelError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ModelError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "classifier".to_string());

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(self.onnx_threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|source| ModelError::Load {
                path: path.to_path_buf(),
                source,
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output_label".to_string());

        let probability_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone());

        info!(
            model = %name,
            input = %input_name,
            label = %label_output,
            probabilities = probability_output.as_deref().unwrap_or("<none>"),
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name,
            session,
            input_name,
            label_output,
            probability_output,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file_is_typed() {
        let loader = ModelLoader::default();
        let err = loader.load_model("models/does_not_exist.onnx").unwrap_err();
        match err {
            ModelError::NotFound { path } => {
                assert!(path.ends_with("does_not_exist.onnx"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_error_display_names_path() {
        let err = ModelError::NotFound {
            path: PathBuf::from("models/heart_disease.onnx"),
        };
        assert!(err.to_string().contains("models/heart_disease.onnx"));
    }
}
