use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::domain::{
    AudioPayload, AudioPayloadError, DecodingOptions, ModelSize, Transcript, TranscriptionRequest,
};

use super::scoped_audio_file::ScopedAudioFile;

pub struct TranscriptionService<E>
where
    E: TranscriptionEngine,
{
    engine: Arc<E>,
    temp_dir: Option<PathBuf>,
    options: DecodingOptions,
}

impl<E> TranscriptionService<E>
where
    E: TranscriptionEngine,
{
    pub fn new(engine: Arc<E>, temp_dir: Option<PathBuf>) -> Self {
        Self {
            engine,
            temp_dir,
            options: DecodingOptions::default(),
        }
    }

    pub fn options(&self) -> &DecodingOptions {
        &self.options
    }

    /// Decodes the payload, stages it in a temporary file and runs the engine
    /// on the blocking pool. The temporary file is gone when this returns.
    #[tracing::instrument(
        skip(self, request),
        fields(
            language = %request.language,
            model_size = %request.model_size,
            payload_chars = request.audio_base64.len(),
        )
    )]
    pub async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> Result<Transcript, TranscribeError> {
        let payload = AudioPayload::from_base64(&request.audio_base64)?;
        tracing::debug!(bytes = payload.len(), "Audio payload decoded");

        let engine = Arc::clone(&self.engine);
        let temp_dir = self.temp_dir.clone();
        let options = self.options.clone();
        let started = Instant::now();

        let transcript = tokio::task::spawn_blocking(move || {
            run_engine(
                engine.as_ref(),
                temp_dir.as_deref(),
                &payload,
                &request.language,
                &request.model_size,
                &options,
            )
        })
        .await
        .map_err(|e| TranscribeError::Worker(e.to_string()))??;

        tracing::info!(
            segments = transcript.segments.len(),
            words = transcript.word_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Transcription completed"
        );

        Ok(transcript)
    }
}

fn run_engine<E: TranscriptionEngine>(
    engine: &E,
    temp_dir: Option<&Path>,
    payload: &AudioPayload,
    language: &str,
    model_size: &ModelSize,
    options: &DecodingOptions,
) -> Result<Transcript, TranscribeError> {
    let audio_file =
        ScopedAudioFile::create(temp_dir, payload.as_bytes()).map_err(TranscribeError::Filesystem)?;
    tracing::debug!(path = %audio_file.path().display(), "Audio staged to temporary file");

    let outcome = invoke_engine(engine, audio_file.path(), language, model_size, options);
    let released = audio_file.release();

    let transcript = outcome?;
    released.map_err(TranscribeError::Filesystem)?;
    Ok(transcript)
}

fn invoke_engine<E: TranscriptionEngine>(
    engine: &E,
    path: &Path,
    language: &str,
    model_size: &ModelSize,
    options: &DecodingOptions,
) -> Result<Transcript, TranscriptionError> {
    let audio = engine.load_audio(path)?;
    let mut model = engine.load_model(model_size)?;
    engine.transcribe(&mut model, &audio, language, options)
}

#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error(transparent)]
    Decode(#[from] AudioPayloadError),
    #[error(transparent)]
    Engine(#[from] TranscriptionError),
    #[error("temporary file error: {0}")]
    Filesystem(std::io::Error),
    #[error("transcription worker failed: {0}")]
    Worker(String),
}
