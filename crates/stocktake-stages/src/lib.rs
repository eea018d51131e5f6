//! # Stocktake Stages
//!
//! Concrete capture and recognition stage implementations: script-driven
//! camera capture and the HTTP client for the vision service.

mod capture;
mod recognition;

pub use capture::ScriptCapture;
pub use recognition::{HttpRecognition, RecognitionClientConfig};

// Re-export the trait surface for convenience.
pub use stocktake_core::stage::{
    CaptureStage, CaptureStepResult, RecognitionError, RecognitionOutcome, RecognitionStage,
};
