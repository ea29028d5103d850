//! Type definitions for the screening service

pub mod assessment;
pub mod report;

pub use assessment::AssessmentInput;
pub use report::{AssessmentReport, RiskLevel};
