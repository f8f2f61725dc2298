use serde::{Deserialize, Serialize};

/// Timestamped transcription produced by an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub language: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: usize,
    /// Mel frame offset of the window this segment was decoded from.
    pub seek: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub tokens: Vec<u32>,
    pub temperature: f32,
    pub avg_logprob: f64,
    pub compression_ratio: f64,
    pub no_speech_prob: f64,
    pub confidence: f64,
    pub words: Vec<WordTiming>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub confidence: f64,
}

impl Transcript {
    pub fn from_segments(language: impl Into<String>, segments: Vec<Segment>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            text,
            language: language.into(),
            segments,
        }
    }

    pub fn word_count(&self) -> usize {
        self.segments.iter().map(|s| s.words.len()).sum()
    }

    pub fn duration(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }
}

impl Segment {
    /// Probability-scale confidence derived from a mean log-probability.
    pub fn confidence_from_logprob(avg_logprob: f64) -> f64 {
        round_millis(avg_logprob.exp().clamp(0.0, 1.0))
    }
}

impl WordTiming {
    /// Splits `text` on whitespace and spreads `[start, end]` across the words
    /// in proportion to their character length.
    pub fn spread(text: &str, start: f64, end: f64, confidence: f64) -> Vec<WordTiming> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let total_chars: usize = words.iter().map(|w| w.chars().count()).sum();
        if words.is_empty() || total_chars == 0 {
            return Vec::new();
        }

        let span = (end - start).max(0.0);
        let mut cursor = start;
        let mut consumed = 0usize;

        words
            .into_iter()
            .map(|word| {
                consumed += word.chars().count();
                let word_end = start + span * consumed as f64 / total_chars as f64;
                let timing = WordTiming {
                    text: word.to_string(),
                    start: round_centis(cursor),
                    end: round_centis(word_end),
                    confidence: round_millis(confidence),
                };
                cursor = word_end;
                timing
            })
            .collect()
    }
}

fn round_centis(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
