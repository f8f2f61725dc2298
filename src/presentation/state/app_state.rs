use std::sync::Arc;

use crate::application::ports::TranscriptionEngine;
use crate::application::services::TranscriptionService;
use crate::presentation::config::Settings;

pub struct AppState<E>
where
    E: TranscriptionEngine,
{
    pub transcription_service: Arc<TranscriptionService<E>>,
    pub settings: Arc<Settings>,
}

impl<E> AppState<E>
where
    E: TranscriptionEngine,
{
    pub fn new(engine: Arc<E>, settings: Settings) -> Self {
        let service = TranscriptionService::new(engine, settings.transcription.temp_dir.clone());
        Self {
            transcription_service: Arc::new(service),
            settings: Arc::new(settings),
        }
    }
}

impl<E> Clone for AppState<E>
where
    E: TranscriptionEngine,
{
    fn clone(&self) -> Self {
        Self {
            transcription_service: Arc::clone(&self.transcription_service),
            settings: Arc::clone(&self.settings),
        }
    }
}
