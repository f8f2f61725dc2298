use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::application::ports::TranscriptionEngine;
use crate::application::services::TranscribeError;
use crate::domain::{ModelSize, Transcript, TranscriptionRequest};
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub audio_base64: String,
    pub language: Option<String>,
    pub model_size: Option<String>,
}

/// Outcome of a transcription call. Failures travel in the body with a 200.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<Transcript>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscribeResponse {
    pub fn success(transcription: Transcript) -> Self {
        Self {
            success: true,
            transcription: Some(transcription),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transcription: None,
            error: Some(error.into()),
        }
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn transcribe_handler<E>(
    State(state): State<AppState<E>>,
    Json(request): Json<TranscribeRequest>,
) -> impl IntoResponse
where
    E: TranscriptionEngine,
{
    let defaults = &state.settings.transcription;
    let request = TranscriptionRequest::new(
        request.audio_base64,
        request
            .language
            .unwrap_or_else(|| defaults.default_language.clone()),
        ModelSize::new(
            request
                .model_size
                .unwrap_or_else(|| defaults.default_model_size.clone()),
        ),
    );

    let response = match state.transcription_service.transcribe(request).await {
        Ok(transcript) => TranscribeResponse::success(transcript),
        Err(e) => {
            if matches!(e, TranscribeError::Decode(_)) {
                tracing::warn!(error = %e, "Rejected transcription payload");
            } else {
                tracing::error!(error = %e, "Transcription failed");
            }
            TranscribeResponse::failure(e.to_string())
        }
    };

    (StatusCode::OK, Json(response))
}
