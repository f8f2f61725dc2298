use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, Config};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::application::ports::{TranscriptionEngine, TranscriptionError, TranscriptionResultExt};
use crate::domain::{DecodingOptions, ModelSize, Transcript};

use super::audio_decoder::{PcmAudio, TARGET_SAMPLE_RATE, decode_audio_file};
use super::whisper_decoder::{SpecialTokens, WindowDecoder, WindowPosition, build_segments};

const MEL_FILTERS_REPO: &str = "FL33TW00D-HF/whisper-base";

/// Local Whisper inference on candle. Models are pulled from the Hugging Face
/// hub on first use and cached on disk by `hf-hub`.
pub struct CandleWhisperEngine {
    device: Device,
}

/// A Whisper checkpoint loaded for a single request.
pub struct WhisperModel {
    model: m::model::Whisper,
    tokenizer: Tokenizer,
    config: Config,
    mel_filters: Vec<f32>,
    english_only: bool,
}

impl CandleWhisperEngine {
    pub fn new() -> Self {
        let device = Device::Cpu;
        tracing::info!(device = ?device, "Candle Whisper transcription engine ready");
        Self { device }
    }

    pub fn select_dtype(device: &Device) -> DType {
        if device.is_cpu() {
            DType::F32
        } else {
            DType::F16
        }
    }

    /// `tiny` maps to `openai/whisper-tiny`; anything containing `/` is taken
    /// as a full repository id.
    pub fn repo_id(model_size: &ModelSize) -> String {
        let size = model_size.as_str().trim();
        if size.contains('/') {
            size.to_string()
        } else {
            format!("openai/whisper-{size}")
        }
    }

    pub fn mel_filters_file(num_mel_bins: usize) -> &'static str {
        if num_mel_bins == 128 {
            "melfilters128.bytes"
        } else {
            "melfilters.bytes"
        }
    }
}

impl Default for CandleWhisperEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptionEngine for CandleWhisperEngine {
    type Audio = PcmAudio;
    type Model = WhisperModel;

    fn load_audio(&self, path: &Path) -> Result<PcmAudio, TranscriptionError> {
        decode_audio_file(path)
    }

    fn load_model(&self, model_size: &ModelSize) -> Result<WhisperModel, TranscriptionError> {
        let repo_id = Self::repo_id(model_size);
        tracing::info!(model = %repo_id, "Loading Whisper model");

        let api = Api::new().model_load("hub api")?;
        let repo = api.repo(Repo::new(repo_id.clone(), RepoType::Model));

        let config_path = repo.get("config.json").model_load("config.json")?;
        let tokenizer_path = repo.get("tokenizer.json").model_load("tokenizer.json")?;
        let weights_path = repo
            .get("model.safetensors")
            .model_load("model.safetensors")?;

        let config_contents = std::fs::read_to_string(&config_path).model_load("read config")?;
        let config: Config = serde_json::from_str(&config_contents).model_load("parse config")?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).model_load("tokenizer")?;

        let mel_file = Self::mel_filters_file(config.num_mel_bins);
        let mel_path = api
            .repo(Repo::new(MEL_FILTERS_REPO.to_string(), RepoType::Model))
            .get(mel_file)
            .model_load(mel_file)?;
        let mel_bytes = std::fs::read(&mel_path).model_load("read mel filters")?;
        let mel_filters = read_mel_filters(&mel_bytes, &config)?;

        let dtype = Self::select_dtype(&self.device);
        // SAFETY: safetensors files are memory-mapped read-only
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], dtype, &self.device)
                .model_load("weights")?
        };
        let model = m::model::Whisper::load(&vb, config.clone()).model_load("model")?;

        tracing::info!(model = %repo_id, "Whisper model loaded");

        Ok(WhisperModel {
            model,
            tokenizer,
            config,
            mel_filters,
            english_only: model_size.is_english_only() || repo_id.ends_with(".en"),
        })
    }

    fn transcribe(
        &self,
        model: &mut WhisperModel,
        audio: &PcmAudio,
        language: &str,
        options: &DecodingOptions,
    ) -> Result<Transcript, TranscriptionError> {
        let tokens = SpecialTokens::resolve(&model.tokenizer, language, model.english_only)?;

        let n_mel = model.config.num_mel_bins;
        let mel = m::audio::pcm_to_mel(&model.config, &audio.samples, &model.mel_filters);
        let mel_frames = mel.len() / n_mel;
        let mel = Tensor::from_vec(mel, (1, n_mel, mel_frames), &self.device)
            .inference("mel tensor")?;

        let content_frames = (audio.samples.len() / m::HOP_LENGTH).min(mel_frames);
        let frame_secs = m::HOP_LENGTH as f64 / TARGET_SAMPLE_RATE as f64;

        let WhisperModel {
            model: whisper,
            tokenizer,
            config,
            ..
        } = model;
        let tokenizer: &Tokenizer = tokenizer;
        let mut decoder = WindowDecoder::new(
            whisper,
            tokenizer,
            &config.suppress_tokens,
            &self.device,
            tokens,
        );

        let mut segments = Vec::new();
        let mut seek = 0;

        while seek < content_frames {
            let window_frames = usize::min(content_frames - seek, m::N_FRAMES);
            let position = WindowPosition {
                seek,
                offset: seek as f64 * frame_secs,
                duration: window_frames as f64 * frame_secs,
            };

            let window = mel.narrow(2, seek, window_frames).inference("mel window")?;
            let features = decoder.encode(&window)?;
            let decoded = decoder.decode(&features, options)?;

            if decoded.is_silence() {
                tracing::debug!(
                    offset = position.offset,
                    no_speech_prob = decoded.no_speech_prob,
                    "Skipping silent window"
                );
            } else {
                let window_segments =
                    build_segments(&decoded, tokenizer, &tokens, position, segments.len())?;
                tracing::debug!(
                    offset = position.offset,
                    temperature = decoded.temperature,
                    compression_ratio = decoded.compression_ratio,
                    segments = window_segments.len(),
                    "Window transcribed"
                );
                segments.extend(window_segments);
            }

            seek += window_frames;
        }

        Ok(Transcript::from_segments(language, segments))
    }
}

fn read_mel_filters(bytes: &[u8], config: &Config) -> Result<Vec<f32>, TranscriptionError> {
    let expected_len = config.num_mel_bins * (m::N_FFT / 2 + 1);
    if bytes.len() < expected_len * 4 {
        return Err(TranscriptionError::ModelLoadFailed(format!(
            "mel filters file too small: {} bytes, expected at least {}",
            bytes.len(),
            expected_len * 4
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .take(expected_len)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
