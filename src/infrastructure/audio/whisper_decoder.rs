use std::io::Write;

use candle_core::{DType, Device, IndexOp, Tensor};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use candle_transformers::models::whisper::{self as m};
use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use tokenizers::Tokenizer;

use crate::application::ports::{TranscriptionError, TranscriptionResultExt};
use crate::domain::{DecodingOptions, Segment, WordTiming};

/// Seconds per timestamp token.
const TIMESTAMP_RESOLUTION: f64 = 0.02;
const MAX_NEW_TOKENS: usize = 224;
const LOGPROB_THRESHOLD: f64 = -1.0;
const NO_SPEECH_THRESHOLD: f64 = 0.6;
/// Above this, decoded text is considered a repetition loop.
const COMPRESSION_RATIO_THRESHOLD: f64 = 2.4;
/// The first timestamp may not exceed one second into the window.
const MAX_INITIAL_TIMESTAMP_TOKENS: u32 = 50;
const SAMPLING_SEED: u64 = 299_792_458;

#[derive(Debug, Clone, Copy)]
pub(super) struct SpecialTokens {
    pub sot: u32,
    pub eot: u32,
    pub transcribe: u32,
    pub timestamp_begin: u32,
    pub no_speech: Option<u32>,
    pub language: Option<u32>,
}

impl SpecialTokens {
    pub fn resolve(
        tokenizer: &Tokenizer,
        language: &str,
        english_only: bool,
    ) -> Result<Self, TranscriptionError> {
        let no_timestamps = token_id(tokenizer, m::NO_TIMESTAMPS_TOKEN)?;
        let timestamp_begin = tokenizer
            .token_to_id("<|0.00|>")
            .unwrap_or(no_timestamps + 1);
        let no_speech = m::NO_SPEECH_TOKENS
            .iter()
            .find_map(|token| tokenizer.token_to_id(token));

        let language = if english_only {
            None
        } else {
            let token = format!("<|{}|>", language.trim().to_lowercase());
            let id = tokenizer.token_to_id(&token).ok_or_else(|| {
                TranscriptionError::TranscriptionFailed(format!(
                    "language not supported by model: {language}"
                ))
            })?;
            Some(id)
        };

        Ok(Self {
            sot: token_id(tokenizer, m::SOT_TOKEN)?,
            eot: token_id(tokenizer, m::EOT_TOKEN)?,
            transcribe: token_id(tokenizer, m::TRANSCRIBE_TOKEN)?,
            timestamp_begin,
            no_speech,
            language,
        })
    }

    pub fn prompt(&self) -> Vec<u32> {
        let mut prompt = vec![self.sot];
        if let Some(language) = self.language {
            prompt.push(language);
        }
        prompt.push(self.transcribe);
        prompt
    }

    pub fn is_timestamp(&self, token: u32) -> bool {
        token >= self.timestamp_begin
    }

    fn seconds(&self, token: u32) -> f64 {
        (token - self.timestamp_begin) as f64 * TIMESTAMP_RESOLUTION
    }
}

fn token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32, TranscriptionError> {
    tokenizer.token_to_id(token).ok_or_else(|| {
        TranscriptionError::TranscriptionFailed(format!("token not found: {token}"))
    })
}

#[derive(Debug, Clone, Default)]
struct Candidate {
    tokens: Vec<u32>,
    sum_logprob: f64,
    finished: bool,
}

impl Candidate {
    fn extend(&self, token: u32, logprob: f64, eot: u32) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token);
        Self {
            tokens,
            sum_logprob: self.sum_logprob + logprob,
            finished: token == eot,
        }
    }

    fn avg_logprob(&self) -> f64 {
        self.sum_logprob / self.tokens.len().max(1) as f64
    }
}

/// Decoding result for one 30 second window.
#[derive(Debug, Clone)]
pub(super) struct WindowDecode {
    pub tokens: Vec<u32>,
    pub avg_logprob: f64,
    pub compression_ratio: f64,
    pub no_speech_prob: f64,
    pub temperature: f32,
    /// Decoding stopped on end-of-text rather than the token limit.
    pub finished: bool,
}

impl WindowDecode {
    pub fn is_silence(&self) -> bool {
        self.no_speech_prob > NO_SPEECH_THRESHOLD && self.avg_logprob < LOGPROB_THRESHOLD
    }

    pub fn needs_fallback(&self) -> bool {
        if self.is_silence() {
            return false;
        }
        !self.finished
            || self.compression_ratio > COMPRESSION_RATIO_THRESHOLD
            || self.avg_logprob < LOGPROB_THRESHOLD
    }
}

/// Where a window sits in the input audio.
#[derive(Debug, Clone, Copy)]
pub(super) struct WindowPosition {
    /// Mel frame the window starts at.
    pub seek: usize,
    /// Window start in seconds.
    pub offset: f64,
    /// Window length in seconds.
    pub duration: f64,
}

/// Tries each temperature in order and returns the first decode that needs no
/// fallback, or the last one when all of them do.
pub(super) fn decode_with_fallback<F>(
    temperatures: &[f32],
    mut attempt: F,
) -> Result<WindowDecode, TranscriptionError>
where
    F: FnMut(f32) -> Result<WindowDecode, TranscriptionError>,
{
    let mut last = None;

    for &temperature in temperatures {
        let decode = attempt(temperature)?;
        if !decode.needs_fallback() {
            return Ok(decode);
        }

        tracing::debug!(
            temperature,
            avg_logprob = decode.avg_logprob,
            compression_ratio = decode.compression_ratio,
            finished = decode.finished,
            "Decode rejected, falling back to next temperature"
        );
        last = Some(decode);
    }

    last.ok_or_else(|| {
        TranscriptionError::TranscriptionFailed("no temperatures configured".to_string())
    })
}

pub(super) struct WindowDecoder<'a> {
    model: &'a mut m::model::Whisper,
    tokenizer: &'a Tokenizer,
    suppress: &'a [u32],
    device: &'a Device,
    tokens: SpecialTokens,
    prompt: Vec<u32>,
    rng: StdRng,
}

impl<'a> WindowDecoder<'a> {
    pub fn new(
        model: &'a mut m::model::Whisper,
        tokenizer: &'a Tokenizer,
        suppress: &'a [u32],
        device: &'a Device,
        tokens: SpecialTokens,
    ) -> Self {
        Self {
            model,
            tokenizer,
            suppress,
            device,
            prompt: tokens.prompt(),
            tokens,
            rng: StdRng::seed_from_u64(SAMPLING_SEED),
        }
    }

    pub fn encode(&mut self, mel: &Tensor) -> Result<Tensor, TranscriptionError> {
        self.model.encoder.forward(mel, true).inference("encoder")
    }

    pub fn decode(
        &mut self,
        features: &Tensor,
        options: &DecodingOptions,
    ) -> Result<WindowDecode, TranscriptionError> {
        self.model.reset_kv_cache();
        let no_speech_prob = self.no_speech_probability(features)?;

        decode_with_fallback(&options.temperatures, |temperature| {
            self.attempt(features, temperature, options, no_speech_prob)
        })
    }

    fn attempt(
        &mut self,
        features: &Tensor,
        temperature: f32,
        options: &DecodingOptions,
        no_speech_prob: f64,
    ) -> Result<WindowDecode, TranscriptionError> {
        let candidate = if temperature <= 0.0 {
            self.beam_search(features, options.beam_size.max(1))?
        } else {
            self.best_of_samples(features, temperature, options.best_of.max(1))?
        };

        let text = decode_text(self.tokenizer, &self.tokens, &candidate.tokens)?;

        Ok(WindowDecode {
            avg_logprob: candidate.avg_logprob(),
            compression_ratio: compression_ratio(&text)?,
            tokens: candidate.tokens,
            no_speech_prob,
            temperature,
            finished: candidate.finished,
        })
    }

    /// Runs the prompt through the decoder, filling the cross-attention cache,
    /// and reads the no-speech probability at the start-of-transcript position.
    fn no_speech_probability(&mut self, features: &Tensor) -> Result<f64, TranscriptionError> {
        let input = Tensor::new(self.prompt.as_slice(), self.device)
            .and_then(|t| t.unsqueeze(0))
            .inference("prompt tensor")?;
        let hidden = self
            .model
            .decoder
            .forward(&input, features, true)
            .inference("decoder")?;

        let Some(no_speech) = self.tokens.no_speech else {
            return Ok(0.0);
        };

        let logits = self.project(&hidden, 0)?;
        let probs = softmax(&logits, 1.0);
        Ok(probs.get(no_speech as usize).copied().unwrap_or(0.0) as f64)
    }

    fn project(&self, hidden: &Tensor, position: usize) -> Result<Vec<f32>, TranscriptionError> {
        let slice = hidden
            .i((..1, position..position + 1))
            .inference("hidden slice")?;
        self.model
            .decoder
            .final_linear(&slice)
            .and_then(|t| t.i(0))
            .and_then(|t| t.i(0))
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.to_vec1::<f32>())
            .inference("final linear")
    }

    fn next_logits(
        &mut self,
        features: &Tensor,
        generated: &[u32],
    ) -> Result<Vec<f32>, TranscriptionError> {
        let mut sequence = self.prompt.clone();
        sequence.extend_from_slice(generated);

        let input = Tensor::new(sequence.as_slice(), self.device)
            .and_then(|t| t.unsqueeze(0))
            .inference("token tensor")?;
        let hidden = self
            .model
            .decoder
            .forward(&input, features, false)
            .inference("decoder")?;

        let mut logits = self.project(&hidden, sequence.len() - 1)?;
        for &token in self.suppress {
            if let Some(logit) = logits.get_mut(token as usize) {
                *logit = f32::NEG_INFINITY;
            }
        }
        apply_timestamp_rules(&mut logits, generated, &self.tokens);
        Ok(logits)
    }

    fn beam_search(
        &mut self,
        features: &Tensor,
        beam_size: usize,
    ) -> Result<Candidate, TranscriptionError> {
        let eot = self.tokens.eot;
        let mut beams = vec![Candidate::default()];
        let mut finished: Vec<Candidate> = Vec::new();

        for _ in 0..MAX_NEW_TOKENS {
            let mut expansions = Vec::with_capacity(beams.len() * (beam_size + 1));

            for beam in &beams {
                let logprobs = log_softmax(&self.next_logits(features, &beam.tokens)?);
                for (token, logprob) in top_k(&logprobs, beam_size + 1) {
                    expansions.push(beam.extend(token, logprob as f64, eot));
                }
            }

            expansions.sort_by(|a, b| b.sum_logprob.total_cmp(&a.sum_logprob));

            beams.clear();
            for candidate in expansions {
                if candidate.finished {
                    if finished.len() < beam_size {
                        finished.push(candidate);
                    }
                } else if beams.len() < beam_size {
                    beams.push(candidate);
                }
            }

            if finished.len() >= beam_size || beams.is_empty() {
                break;
            }
        }

        finished
            .into_iter()
            .chain(beams)
            .max_by(|a, b| {
                a.finished
                    .cmp(&b.finished)
                    .then(a.avg_logprob().total_cmp(&b.avg_logprob()))
            })
            .ok_or_else(|| {
                TranscriptionError::TranscriptionFailed(
                    "beam search produced no candidates".to_string(),
                )
            })
    }

    fn best_of_samples(
        &mut self,
        features: &Tensor,
        temperature: f32,
        best_of: usize,
    ) -> Result<Candidate, TranscriptionError> {
        let mut best: Option<Candidate> = None;

        for _ in 0..best_of {
            let candidate = self.sample(features, temperature)?;
            let better = best
                .as_ref()
                .is_none_or(|b| candidate.avg_logprob() > b.avg_logprob());
            if better {
                best = Some(candidate);
            }
        }

        best.ok_or_else(|| {
            TranscriptionError::TranscriptionFailed("sampling produced no candidates".to_string())
        })
    }

    fn sample(
        &mut self,
        features: &Tensor,
        temperature: f32,
    ) -> Result<Candidate, TranscriptionError> {
        let eot = self.tokens.eot;
        let mut candidate = Candidate::default();

        for _ in 0..MAX_NEW_TOKENS {
            let logits = self.next_logits(features, &candidate.tokens)?;
            let logprobs = log_softmax(&logits);
            let probs = softmax(&logits, temperature);

            let distribution = WeightedIndex::new(&probs).inference("sampling weights")?;
            let token = distribution.sample(&mut self.rng) as u32;

            candidate = candidate.extend(token, logprobs[token as usize] as f64, eot);
            if candidate.finished {
                break;
            }
        }

        Ok(candidate)
    }
}

/// Enforces the timestamp grammar: timestamps come in pairs, never decrease,
/// and the window opens with an early timestamp.
pub(super) fn apply_timestamp_rules(
    logits: &mut [f32],
    generated: &[u32],
    tokens: &SpecialTokens,
) {
    let begin = tokens.timestamp_begin as usize;
    if begin >= logits.len() {
        return;
    }

    if generated.is_empty() {
        logits[..begin].fill(f32::NEG_INFINITY);
        let max_initial = begin + MAX_INITIAL_TIMESTAMP_TOKENS as usize + 1;
        if max_initial < logits.len() {
            logits[max_initial..].fill(f32::NEG_INFINITY);
        }
        return;
    }

    let last_was_timestamp = generated.last().is_some_and(|&t| tokens.is_timestamp(t));
    let penultimate_was_timestamp =
        generated.len() < 2 || tokens.is_timestamp(generated[generated.len() - 2]);

    if last_was_timestamp {
        if penultimate_was_timestamp {
            logits[begin..].fill(f32::NEG_INFINITY);
        } else {
            let eot = tokens.eot as usize;
            logits[..eot.min(begin)].fill(f32::NEG_INFINITY);
        }
    }

    if let Some(&last_timestamp) = generated.iter().rev().find(|&&t| tokens.is_timestamp(t)) {
        let floor = if last_was_timestamp && !penultimate_was_timestamp {
            last_timestamp as usize
        } else {
            last_timestamp as usize + 1
        };
        let floor = floor.min(logits.len());
        logits[begin..floor].fill(f32::NEG_INFINITY);
    }
}

/// Splits decoded tokens into timestamped segments placed at `position`.
pub(super) fn build_segments(
    decode: &WindowDecode,
    tokenizer: &Tokenizer,
    tokens: &SpecialTokens,
    position: WindowPosition,
    first_id: usize,
) -> Result<Vec<Segment>, TranscriptionError> {
    struct Span {
        start: f64,
        end: f64,
        text_tokens: Vec<u32>,
        tokens: Vec<u32>,
    }

    let mut spans: Vec<Span> = Vec::new();
    let mut start: Option<f64> = None;
    let mut text_tokens: Vec<u32> = Vec::new();
    let mut span_tokens: Vec<u32> = Vec::new();

    for &token in &decode.tokens {
        if token == tokens.eot {
            break;
        }
        if !tokens.is_timestamp(token) {
            text_tokens.push(token);
            span_tokens.push(token);
            continue;
        }

        let time = tokens.seconds(token).min(position.duration);
        match start {
            Some(s) if !text_tokens.is_empty() => {
                span_tokens.push(token);
                spans.push(Span {
                    start: s,
                    end: time,
                    text_tokens: std::mem::take(&mut text_tokens),
                    tokens: std::mem::take(&mut span_tokens),
                });
                start = None;
            }
            _ => {
                start = Some(time);
                if text_tokens.is_empty() {
                    span_tokens.clear();
                }
                span_tokens.push(token);
            }
        }
    }

    if !text_tokens.is_empty() {
        spans.push(Span {
            start: start.unwrap_or(0.0),
            end: position.duration,
            text_tokens,
            tokens: span_tokens,
        });
    }

    let confidence = Segment::confidence_from_logprob(decode.avg_logprob);
    let mut segments = Vec::with_capacity(spans.len());

    for span in spans {
        let text = tokenizer
            .decode(&span.text_tokens, true)
            .inference("detokenize")?
            .trim()
            .to_string();
        if text.is_empty() {
            continue;
        }

        let start = position.offset + span.start;
        let end = position.offset + span.end.max(span.start);
        segments.push(Segment {
            id: first_id + segments.len(),
            seek: position.seek,
            start,
            end,
            words: WordTiming::spread(&text, start, end, confidence),
            text,
            tokens: span.tokens,
            temperature: decode.temperature,
            avg_logprob: decode.avg_logprob,
            compression_ratio: decode.compression_ratio,
            no_speech_prob: decode.no_speech_prob,
            confidence,
        });
    }

    Ok(segments)
}

/// Text of the decoded tokens, without timestamps or end-of-text.
fn decode_text(
    tokenizer: &Tokenizer,
    tokens: &SpecialTokens,
    decoded: &[u32],
) -> Result<String, TranscriptionError> {
    let text_tokens: Vec<u32> = decoded
        .iter()
        .copied()
        .filter(|&t| t != tokens.eot && !tokens.is_timestamp(t))
        .collect();
    tokenizer
        .decode(&text_tokens, true)
        .inference("detokenize")
}

/// Ratio of UTF-8 length to zlib-compressed length. Repetitive text compresses
/// well and scores high.
pub(super) fn compression_ratio(text: &str) -> Result<f64, TranscriptionError> {
    if text.is_empty() {
        return Ok(0.0);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).inference("compress")?;
    let compressed = encoder.finish().inference("compress")?;

    Ok(text.len() as f64 / compressed.len().max(1) as f64)
}

pub(super) fn softmax(logits: &[f32], temperature: f32) -> Vec<f32> {
    let temperature = if temperature > 0.0 { temperature } else { 1.0 };
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; logits.len()];
    }
    let exps: Vec<f32> = logits
        .iter()
        .map(|&l| ((l - max) / temperature).exp())
        .collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

pub(super) fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let log_sum = logits.iter().map(|&l| (l - max).exp()).sum::<f32>().ln() + max;
    logits.iter().map(|&l| l - log_sum).collect()
}

fn top_k(values: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut indexed: Vec<(u32, f32)> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i as u32, v))
        .collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
    indexed.truncate(k);
    indexed
}
