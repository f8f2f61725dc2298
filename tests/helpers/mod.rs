#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use base64::Engine as _;
use base64::engine::general_purpose;

use scribe::application::ports::{TranscriptionEngine, TranscriptionError};
use scribe::domain::{DecodingOptions, ModelSize, Segment, Transcript, WordTiming};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadAudio,
    LoadModel,
    Transcribe,
    Panic,
}

#[derive(Debug, Clone)]
pub struct EngineCall {
    pub path: PathBuf,
    pub existed: bool,
    pub bytes: usize,
    pub language: Option<String>,
    pub model_size: Option<ModelSize>,
    pub options: Option<DecodingOptions>,
}

/// Engine double that reads the staged file and answers with a fixed transcript.
#[derive(Default)]
pub struct MockEngine {
    pub fail_at: Option<Stage>,
    pub calls: Mutex<Vec<EngineCall>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(stage: Stage) -> Self {
        Self {
            fail_at: Some(stage),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    fn update_last(&self, f: impl FnOnce(&mut EngineCall)) {
        if let Some(call) = self.calls.lock().unwrap().last_mut() {
            f(call);
        }
    }
}

pub struct MockAudio {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl TranscriptionEngine for MockEngine {
    type Audio = MockAudio;
    type Model = ModelSize;

    fn load_audio(&self, path: &Path) -> Result<MockAudio, TranscriptionError> {
        let existed = path.exists();
        let bytes = std::fs::read(path).unwrap_or_default();
        self.calls.lock().unwrap().push(EngineCall {
            path: path.to_path_buf(),
            existed,
            bytes: bytes.len(),
            language: None,
            model_size: None,
            options: None,
        });

        match self.fail_at {
            Some(Stage::LoadAudio) => Err(TranscriptionError::DecodingFailed(
                "file does not start with RIFF id".to_string(),
            )),
            Some(Stage::Panic) => panic!("engine crashed"),
            _ => Ok(MockAudio {
                path: path.to_path_buf(),
                bytes,
            }),
        }
    }

    fn load_model(&self, model_size: &ModelSize) -> Result<ModelSize, TranscriptionError> {
        self.update_last(|call| call.model_size = Some(model_size.clone()));
        if self.fail_at == Some(Stage::LoadModel) {
            return Err(TranscriptionError::ModelLoadFailed(format!(
                "unknown model: {model_size}"
            )));
        }
        Ok(model_size.clone())
    }

    fn transcribe(
        &self,
        _model: &mut ModelSize,
        audio: &MockAudio,
        language: &str,
        options: &DecodingOptions,
    ) -> Result<Transcript, TranscriptionError> {
        self.update_last(|call| {
            call.language = Some(language.to_string());
            call.options = Some(options.clone());
        });
        if self.fail_at == Some(Stage::Transcribe) {
            return Err(TranscriptionError::TranscriptionFailed(
                "decoder exploded".to_string(),
            ));
        }

        let text = format!("hello world {} bytes", audio.bytes.len());
        let segment = Segment {
            id: 0,
            seek: 0,
            start: 0.0,
            end: 2.0,
            words: WordTiming::spread(&text, 0.0, 2.0, 0.9),
            text,
            tokens: vec![50364, 2425, 1002, 50464],
            temperature: 0.0,
            avg_logprob: -0.1,
            compression_ratio: 1.1,
            no_speech_prob: 0.01,
            confidence: 0.905,
        };
        Ok(Transcript::from_segments(language, vec![segment]))
    }
}

pub fn build_wav(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let data_size = (samples.len() * 2) as u32;
    let byte_rate = sample_rate * channels as u32 * 2;
    let block_align = channels * 2;

    let mut wav = Vec::with_capacity(44 + data_size as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        wav.extend_from_slice(&s.to_le_bytes());
    }
    wav
}

pub fn encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
