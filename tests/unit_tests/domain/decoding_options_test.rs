use scribe::domain::{DEFAULT_LANGUAGE, DecodingOptions, ModelSize, TranscriptionRequest};

#[test]
fn given_default_options_when_created_then_match_fixed_decoding_parameters() {
    let options = DecodingOptions::default();

    assert_eq!(options.beam_size, 5);
    assert_eq!(options.best_of, 5);
    assert_eq!(options.temperatures, vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
}

#[test]
fn given_default_model_size_when_created_then_is_tiny() {
    assert_eq!(ModelSize::default().as_str(), "tiny");
}

#[test]
fn given_english_only_model_when_checking_then_is_detected() {
    assert!(ModelSize::new("base.en").is_english_only());
    assert!(!ModelSize::new("base").is_english_only());
}

#[test]
fn given_request_with_defaults_when_created_then_uses_english_and_tiny() {
    let request = TranscriptionRequest::with_defaults("UklGRg==".to_string());

    assert_eq!(request.language, DEFAULT_LANGUAGE);
    assert_eq!(request.model_size, ModelSize::new("tiny"));
}
