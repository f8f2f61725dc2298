/// Decoding parameters handed to the engine with every transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodingOptions {
    pub beam_size: usize,
    pub best_of: usize,
    /// Temperatures tried in order until a decode is accepted.
    pub temperatures: Vec<f32>,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            beam_size: 5,
            best_of: 5,
            temperatures: vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0],
        }
    }
}
