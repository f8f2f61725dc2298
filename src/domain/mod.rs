mod audio_payload;
mod decoding_options;
mod model_size;
mod transcript;
mod transcription_request;

pub use audio_payload::{AudioPayload, AudioPayloadError};
pub use decoding_options::DecodingOptions;
pub use model_size::{DEFAULT_MODEL_SIZE, ModelSize};
pub use transcript::{Segment, Transcript, WordTiming};
pub use transcription_request::{DEFAULT_LANGUAGE, TranscriptionRequest};
