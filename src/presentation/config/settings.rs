use std::path::PathBuf;

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_LANGUAGE, DEFAULT_MODEL_SIZE};

use super::Environment;

const ENV_PREFIX: &str = "APP";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub cors: CorsSettings,
    pub transcription: TranscriptionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProviderSetting,
    pub default_language: String,
    pub default_model_size: String,
    /// Directory for per-request audio files; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
    pub max_audio_size_mb: usize,
    pub openai: OpenAiSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProviderSetting {
    Local,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Layers built-in defaults, `appsettings.<environment>` and `APP__*`
    /// environment variables, in that order.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let file_name = format!("appsettings.{}", environment.as_str());
        Self::load_from(&file_name)
    }

    pub fn load_from(file_name: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name(file_name).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("cors.allowed_methods")
                    .with_list_parse_key("cors.allowed_headers")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Room for the JSON envelope and the optional fields around the payload.
const JSON_ENVELOPE_BYTES: usize = 64 * 1024;

impl TranscriptionSettings {
    pub fn max_audio_size_bytes(&self) -> usize {
        self.max_audio_size_mb.saturating_mul(1024 * 1024)
    }

    /// Request body limit that admits `max_audio_size_mb` of audio once base64
    /// encoded (4 output bytes per 3 input bytes).
    pub fn max_request_body_bytes(&self) -> usize {
        self.max_audio_size_bytes()
            .div_ceil(3)
            .saturating_mul(4)
            .saturating_add(JSON_ENVELOPE_BYTES)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            cors: CorsSettings {
                allowed_origins: vec![
                    "https://main.d32j7a46oq8pb3.amplifyapp.com".to_string(),
                    "https://dev.d32j7a46oq8pb3.amplifyapp.com".to_string(),
                ],
                allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                    .map(String::from)
                    .to_vec(),
                allowed_headers: ["Content-Type", "Authorization"]
                    .map(String::from)
                    .to_vec(),
                allow_credentials: true,
            },
            transcription: TranscriptionSettings {
                provider: TranscriptionProviderSetting::Local,
                default_language: DEFAULT_LANGUAGE.to_string(),
                default_model_size: DEFAULT_MODEL_SIZE.to_string(),
                temp_dir: None,
                max_audio_size_mb: 50,
                openai: OpenAiSettings {
                    api_key: String::new(),
                    base_url: "https://api.openai.com/v1".to_string(),
                    model: "whisper-1".to_string(),
                },
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                enable_json: false,
            },
        }
    }
}
