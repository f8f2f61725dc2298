use std::path::Path;

use reqwest::blocking::{Client, multipart};
use serde::Deserialize;

use crate::application::ports::{TranscriptionEngine, TranscriptionError, TranscriptionResultExt};
use crate::domain::{DecodingOptions, ModelSize, Segment, Transcript, WordTiming};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "whisper-1";

/// Delegates transcription to an OpenAI-compatible `/audio/transcriptions`
/// endpoint, asking for segment and word timestamps.
pub struct OpenAiWhisperEngine {
    api_key: String,
    base_url: String,
    model: String,
}

/// HTTP session bound to one remote model.
pub struct OpenAiSession {
    client: Client,
    model: String,
}

impl OpenAiWhisperEngine {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            api_key,
            base_url: base_url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
    #[serde(default)]
    words: Vec<VerboseWord>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    #[serde(default)]
    id: usize,
    #[serde(default)]
    seek: usize,
    start: f64,
    end: f64,
    text: String,
    #[serde(default)]
    tokens: Vec<u32>,
    #[serde(default)]
    temperature: f32,
    #[serde(default)]
    avg_logprob: f64,
    #[serde(default)]
    compression_ratio: f64,
    #[serde(default)]
    no_speech_prob: f64,
}

#[derive(Debug, Deserialize)]
struct VerboseWord {
    word: String,
    start: f64,
    end: f64,
}

impl TranscriptionEngine for OpenAiWhisperEngine {
    type Audio = Vec<u8>;
    type Model = OpenAiSession;

    fn load_audio(&self, path: &Path) -> Result<Vec<u8>, TranscriptionError> {
        let bytes = std::fs::read(path).decoding("read audio file")?;
        if bytes.is_empty() {
            return Err(TranscriptionError::DecodingFailed(
                "audio file is empty".to_string(),
            ));
        }
        Ok(bytes)
    }

    fn load_model(&self, model_size: &ModelSize) -> Result<OpenAiSession, TranscriptionError> {
        tracing::debug!(
            model = %self.model,
            requested_size = %model_size,
            "Remote engine ignores model size, using configured model"
        );
        let client = Client::builder().build().model_load("http client")?;
        Ok(OpenAiSession {
            client,
            model: self.model.clone(),
        })
    }

    fn transcribe(
        &self,
        session: &mut OpenAiSession,
        audio: &Vec<u8>,
        language: &str,
        options: &DecodingOptions,
    ) -> Result<Transcript, TranscriptionError> {
        let temperature = options.temperatures.first().copied().unwrap_or(0.0);

        let file_part = multipart::Part::bytes(audio.clone())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .api_request("mime")?;

        let form = multipart::Form::new()
            .text("model", session.model.clone())
            .text("language", language.to_string())
            .text("temperature", temperature.to_string())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word")
            .text("timestamp_granularities[]", "segment")
            .part("file", file_part);

        tracing::debug!(
            model = %session.model,
            bytes = audio.len(),
            "Sending audio to OpenAI Whisper API"
        );

        let response = session
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .api_request("request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {status}: {body}"
            )));
        }

        let result: VerboseTranscription = response.json().api_request("parse response")?;
        let transcript = into_transcript(result, language);

        tracing::info!(
            segments = transcript.segments.len(),
            words = transcript.word_count(),
            "OpenAI Whisper transcription completed"
        );

        Ok(transcript)
    }
}

/// Assigns each word to the segment its start falls into. Without segments the
/// whole response becomes a single segment.
fn into_transcript(result: VerboseTranscription, language: &str) -> Transcript {
    let VerboseTranscription {
        text,
        duration,
        segments,
        words,
    } = result;

    let word_timing = |w: &VerboseWord, confidence: f64| WordTiming {
        text: w.word.trim().to_string(),
        start: w.start,
        end: w.end,
        confidence,
    };

    if segments.is_empty() {
        let end = words
            .last()
            .map(|w| w.end)
            .or(duration)
            .unwrap_or(0.0);
        let text = text.trim().to_string();
        if text.is_empty() {
            return Transcript::from_segments(language, Vec::new());
        }
        let timed_words = if words.is_empty() {
            WordTiming::spread(&text, 0.0, end, 1.0)
        } else {
            words.iter().map(|w| word_timing(w, 1.0)).collect()
        };
        let segment = Segment {
            id: 0,
            seek: 0,
            start: 0.0,
            end,
            text,
            tokens: Vec::new(),
            temperature: 0.0,
            avg_logprob: 0.0,
            compression_ratio: 0.0,
            no_speech_prob: 0.0,
            confidence: 1.0,
            words: timed_words,
        };
        return Transcript::from_segments(language, vec![segment]);
    }

    let last_index = segments.len() - 1;
    let segments = segments
        .into_iter()
        .enumerate()
        .map(|(index, s)| {
            let confidence = Segment::confidence_from_logprob(s.avg_logprob);
            let in_segment = |w: &&VerboseWord| {
                w.start >= s.start && (w.start < s.end || index == last_index)
            };
            let mut timed_words: Vec<WordTiming> = words
                .iter()
                .filter(in_segment)
                .map(|w| word_timing(w, confidence))
                .collect();
            if timed_words.is_empty() {
                timed_words = WordTiming::spread(&s.text, s.start, s.end, confidence);
            }

            Segment {
                id: s.id,
                seek: s.seek,
                start: s.start,
                end: s.end,
                text: s.text.trim().to_string(),
                tokens: s.tokens,
                temperature: s.temperature,
                avg_logprob: s.avg_logprob,
                compression_ratio: s.compression_ratio,
                no_speech_prob: s.no_speech_prob,
                confidence,
                words: timed_words,
            }
        })
        .collect();

    Transcript::from_segments(language, segments)
}
