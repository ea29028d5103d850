//! Classifier loading and invocation

pub mod loader;
pub mod predictor;

pub use loader::{ModelError, ModelLoader};
pub use predictor::{Prediction, Predictor};
