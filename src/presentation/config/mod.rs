mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    CorsSettings, LoggingSettings, OpenAiSettings, ServerSettings, Settings,
    TranscriptionProviderSetting, TranscriptionSettings,
};
