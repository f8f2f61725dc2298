use scribe::presentation::config::CorsSettings;
use scribe::presentation::{CorsConfigError, Settings, build_cors_layer};

fn cors_settings() -> CorsSettings {
    Settings::default().cors
}

#[test]
fn given_default_cors_settings_when_building_layer_then_succeeds() {
    assert!(build_cors_layer(&cors_settings()).is_ok());
}

#[test]
fn given_lowercase_method_when_building_layer_then_it_is_accepted() {
    let mut settings = cors_settings();
    settings.allowed_methods = vec!["get".to_string(), " post ".to_string()];

    assert!(build_cors_layer(&settings).is_ok());
}

#[test]
fn given_malformed_method_when_building_layer_then_returns_method_error() {
    let mut settings = cors_settings();
    settings.allowed_methods = vec!["BAD METHOD".to_string()];

    let result = build_cors_layer(&settings);

    assert!(matches!(result, Err(CorsConfigError::Method(m)) if m == "BAD METHOD"));
}

#[test]
fn given_malformed_header_when_building_layer_then_returns_header_error() {
    let mut settings = cors_settings();
    settings.allowed_headers = vec!["bad header".to_string()];

    assert!(matches!(
        build_cors_layer(&settings),
        Err(CorsConfigError::Header(_))
    ));
}

#[test]
fn given_origin_with_control_character_when_building_layer_then_returns_origin_error() {
    let mut settings = cors_settings();
    settings.allowed_origins = vec!["https://example.com\n".to_string()];

    assert!(matches!(
        build_cors_layer(&settings),
        Err(CorsConfigError::Origin(_))
    ));
}

#[test]
fn given_wildcard_origin_when_building_layer_then_returns_origin_error() {
    let mut settings = cors_settings();
    settings.allowed_origins = vec![
        "https://main.d32j7a46oq8pb3.amplifyapp.com".to_string(),
        "*".to_string(),
    ];

    assert!(matches!(
        build_cors_layer(&settings),
        Err(CorsConfigError::Origin(o)) if o == "*"
    ));
}
