use std::fmt;

pub const DEFAULT_MODEL_SIZE: &str = "tiny";

/// Model size hint forwarded to the engine, e.g. `tiny`, `base` or `large-v3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelSize(String);

impl ModelSize {
    pub fn new(size: impl Into<String>) -> Self {
        Self(size.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_english_only(&self) -> bool {
        self.0.ends_with(".en")
    }
}

impl Default for ModelSize {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_SIZE)
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
