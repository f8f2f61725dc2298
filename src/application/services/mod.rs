mod scoped_audio_file;
mod transcription_service;

pub use scoped_audio_file::ScopedAudioFile;
pub use transcription_service::{TranscribeError, TranscriptionService};
