use base64::Engine as _;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};

const DATA_URI_MARKER: &str = ";base64,";

/// Standard alphabet, lenient about non-zero trailing bits.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Raw audio bytes decoded from a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload(Vec<u8>);

#[derive(Debug, thiserror::Error)]
pub enum AudioPayloadError {
    #[error("invalid base64 audio: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("audio payload is empty")]
    Empty,
}

impl AudioPayload {
    /// Decodes standard base64, tolerating a `data:<mime>;base64,` prefix and
    /// ASCII whitespace anywhere in the payload (line-wrapped MIME output).
    pub fn from_base64(encoded: &str) -> Result<Self, AudioPayloadError> {
        let encoded = encoded.trim();
        let encoded = match encoded.find(DATA_URI_MARKER) {
            Some(idx) if encoded.starts_with("data:") => &encoded[idx + DATA_URI_MARKER.len()..],
            _ => encoded,
        };

        let compact: Vec<u8> = encoded
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let bytes = LENIENT_STANDARD.decode(&compact)?;
        if bytes.is_empty() {
            return Err(AudioPayloadError::Empty);
        }

        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
