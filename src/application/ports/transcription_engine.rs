use std::path::Path;

use crate::domain::{DecodingOptions, ModelSize, Transcript};

/// Speech-to-text capability used by the transcription service.
///
/// Calls are blocking; the service drives them from tokio's blocking pool.
/// Each request loads its own audio and model, so implementations must not
/// share mutable state between calls.
pub trait TranscriptionEngine: Send + Sync + 'static {
    type Audio: Send;
    type Model: Send;

    fn load_audio(&self, path: &Path) -> Result<Self::Audio, TranscriptionError>;

    fn load_model(&self, model_size: &ModelSize) -> Result<Self::Model, TranscriptionError>;

    fn transcribe(
        &self,
        model: &mut Self::Model,
        audio: &Self::Audio,
        language: &str,
        options: &DecodingOptions,
    ) -> Result<Transcript, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
}

/// Shortens `.map_err()` chains when wrapping foreign errors.
pub trait TranscriptionResultExt<T> {
    fn decoding(self, context: &str) -> Result<T, TranscriptionError>;
    fn inference(self, context: &str) -> Result<T, TranscriptionError>;
    fn model_load(self, context: &str) -> Result<T, TranscriptionError>;
    fn api_request(self, context: &str) -> Result<T, TranscriptionError>;
}

impl<T, E: std::fmt::Display> TranscriptionResultExt<T> for Result<T, E> {
    fn decoding(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::DecodingFailed(format!("{context}: {e}")))
    }

    fn inference(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::TranscriptionFailed(format!("{context}: {e}")))
    }

    fn model_load(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::ModelLoadFailed(format!("{context}: {e}")))
    }

    fn api_request(self, context: &str) -> Result<T, TranscriptionError> {
        self.map_err(|e| TranscriptionError::ApiRequestFailed(format!("{context}: {e}")))
    }
}
