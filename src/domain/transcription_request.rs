use super::model_size::ModelSize;

pub const DEFAULT_LANGUAGE: &str = "en";

/// A transcription call as received from a client, before decoding.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub audio_base64: String,
    pub language: String,
    pub model_size: ModelSize,
}

impl TranscriptionRequest {
    pub fn new(audio_base64: String, language: String, model_size: ModelSize) -> Self {
        Self {
            audio_base64,
            language,
            model_size,
        }
    }

    pub fn with_defaults(audio_base64: String) -> Self {
        Self::new(
            audio_base64,
            DEFAULT_LANGUAGE.to_string(),
            ModelSize::default(),
        )
    }
}
