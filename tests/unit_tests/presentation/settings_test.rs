use scribe::presentation::{Settings, TranscriptionProviderSetting};
use tempfile::TempDir;

#[test]
fn given_default_settings_when_created_then_serve_on_port_8000() {
    let settings = Settings::default();

    assert_eq!(settings.bind_address(), "0.0.0.0:8000");
}

#[test]
fn given_default_settings_when_created_then_cors_allows_amplify_origins_with_credentials() {
    let cors = Settings::default().cors;

    assert_eq!(
        cors.allowed_origins,
        vec![
            "https://main.d32j7a46oq8pb3.amplifyapp.com",
            "https://dev.d32j7a46oq8pb3.amplifyapp.com",
        ]
    );
    assert_eq!(
        cors.allowed_methods,
        vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"]
    );
    assert_eq!(cors.allowed_headers, vec!["Content-Type", "Authorization"]);
    assert!(cors.allow_credentials);
}

#[test]
fn given_default_settings_when_created_then_transcription_uses_local_tiny_english() {
    let transcription = Settings::default().transcription;

    assert_eq!(transcription.provider, TranscriptionProviderSetting::Local);
    assert_eq!(transcription.default_language, "en");
    assert_eq!(transcription.default_model_size, "tiny");
    assert!(transcription.temp_dir.is_none());
    assert_eq!(transcription.max_audio_size_bytes(), 50 * 1024 * 1024);
}

#[test]
fn given_missing_settings_file_when_loading_then_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let name = dir.path().join("appsettings.absent");

    let settings = Settings::load_from(name.to_str().unwrap()).unwrap();

    assert_eq!(settings.server.port, 8000);
    assert_eq!(settings.transcription.default_model_size, "tiny");
}

#[test]
fn given_settings_file_when_loading_then_file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("appsettings.test.toml"),
        r#"
[server]
port = 9100

[cors]
allowed_origins = ["http://localhost:3000"]

[transcription]
provider = "openai"
default_model_size = "base"

[transcription.openai]
api_key = "sk-file"
"#,
    )
    .unwrap();
    let name = dir.path().join("appsettings.test");

    let settings = Settings::load_from(name.to_str().unwrap()).unwrap();

    assert_eq!(settings.server.port, 9100);
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.cors.allowed_origins, vec!["http://localhost:3000"]);
    assert_eq!(settings.cors.allowed_methods.len(), 5);
    assert_eq!(settings.transcription.provider, TranscriptionProviderSetting::OpenAi);
    assert_eq!(settings.transcription.default_model_size, "base");
    assert_eq!(settings.transcription.openai.api_key, "sk-file");
    assert_eq!(settings.transcription.openai.model, "whisper-1");
}

#[test]
fn given_audio_limit_when_computing_body_limit_then_base64_expansion_fits() {
    let transcription = Settings::default().transcription;
    let audio = transcription.max_audio_size_bytes();
    let encoded_len = audio.div_ceil(3) * 4;

    let body_limit = transcription.max_request_body_bytes();

    assert!(body_limit >= encoded_len);
    assert!(body_limit < audio * 2);
}
