use std::io::Write;

use tempfile::NamedTempFile;

use crate::helpers::build_wav;
use scribe::application::ports::TranscriptionError;
use scribe::infrastructure::audio::{TARGET_SAMPLE_RATE, decode_audio_file};

fn write_temp(bytes: &[u8], suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn given_16khz_mono_wav_when_decoding_then_samples_pass_through() {
    let samples = vec![0i16; 1600];
    let file = write_temp(&build_wav(16_000, 1, &samples), ".wav");

    let audio = decode_audio_file(file.path()).unwrap();

    assert_eq!(audio.samples.len(), 1600);
    assert!((audio.duration_secs() - 0.1).abs() < 1e-9);
}

#[test]
fn given_pcm_values_when_decoding_then_they_are_normalised_to_unit_range() {
    let file = write_temp(&build_wav(16_000, 1, &[i16::MAX, 0, i16::MIN]), ".wav");

    let audio = decode_audio_file(file.path()).unwrap();

    assert!(audio.samples[0] > 0.99);
    assert_eq!(audio.samples[1], 0.0);
    assert!(audio.samples[2] <= -0.99);
}

#[test]
fn given_44100hz_wav_when_decoding_then_resamples_to_16khz() {
    let samples = vec![0i16; 4410];
    let file = write_temp(&build_wav(44_100, 1, &samples), ".wav");

    let audio = decode_audio_file(file.path()).unwrap();

    // 0.1s at 44.1kHz is roughly 1600 samples at 16kHz
    let expected = (4410.0 * TARGET_SAMPLE_RATE as f64 / 44_100.0) as usize;
    assert!(!audio.samples.is_empty());
    assert!(audio.samples.len() <= expected);
    assert!(audio.samples.len() > expected / 2);
}

#[test]
fn given_stereo_wav_when_decoding_then_channels_are_averaged() {
    // Interleaved L/R frames: left full scale, right silent.
    let interleaved: Vec<i16> = (0..800).flat_map(|_| [16_384i16, 0]).collect();
    let file = write_temp(&build_wav(16_000, 2, &interleaved), ".wav");

    let audio = decode_audio_file(file.path()).unwrap();

    assert_eq!(audio.samples.len(), 800);
    assert!((audio.samples[0] - 0.25).abs() < 1e-3);
}

#[test]
fn given_garbage_bytes_when_decoding_then_returns_error() {
    let file = write_temp(&[0xFFu8; 256], ".bin");

    let result = decode_audio_file(file.path());

    assert!(matches!(
        result,
        Err(TranscriptionError::UnsupportedFormat(_)) | Err(TranscriptionError::DecodingFailed(_))
    ));
}

#[test]
fn given_wav_without_samples_when_decoding_then_returns_decoding_failed() {
    let file = write_temp(&build_wav(16_000, 1, &[]), ".wav");

    let result = decode_audio_file(file.path());

    assert!(result.is_err());
}

#[test]
fn given_missing_file_when_decoding_then_returns_decoding_failed() {
    let dir = tempfile::TempDir::new().unwrap();

    let result = decode_audio_file(&dir.path().join("absent.wav"));

    assert!(matches!(result, Err(TranscriptionError::DecodingFailed(_))));
}
