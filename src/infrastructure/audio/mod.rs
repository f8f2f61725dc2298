pub mod audio_decoder;
mod candle_whisper_engine;
mod openai_whisper_engine;
mod whisper_decoder;

pub use audio_decoder::{PcmAudio, TARGET_SAMPLE_RATE, decode_audio_file};
pub use candle_whisper_engine::{CandleWhisperEngine, WhisperModel};
pub use openai_whisper_engine::{OpenAiSession, OpenAiWhisperEngine};
