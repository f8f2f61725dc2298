use scribe::domain::{Segment, Transcript, WordTiming};

fn segment(id: usize, start: f64, end: f64, text: &str) -> Segment {
    Segment {
        id,
        seek: 0,
        start,
        end,
        text: text.to_string(),
        tokens: vec![50364, 50414],
        temperature: 0.0,
        avg_logprob: -0.2,
        compression_ratio: 1.2,
        no_speech_prob: 0.05,
        confidence: Segment::confidence_from_logprob(-0.2),
        words: WordTiming::spread(text, start, end, 0.8),
    }
}

#[test]
fn given_words_of_equal_length_when_spreading_then_time_is_split_evenly() {
    let words = WordTiming::spread("ab cd", 0.0, 1.0, 0.9);

    assert_eq!(words.len(), 2);
    assert_eq!((words[0].start, words[0].end), (0.0, 0.5));
    assert_eq!((words[1].start, words[1].end), (0.5, 1.0));
}

#[test]
fn given_words_of_different_length_when_spreading_then_longer_word_gets_more_time() {
    let words = WordTiming::spread("a abc", 2.0, 4.0, 0.9);

    assert_eq!(words[0].end, 2.5);
    assert_eq!(words[1].start, 2.5);
    assert_eq!(words[1].end, 4.0);
}

#[test]
fn given_word_timings_when_spreading_then_last_word_ends_at_segment_end() {
    let words = WordTiming::spread("the quick brown fox", 1.0, 3.37, 0.5);

    assert_eq!(words.first().unwrap().start, 1.0);
    assert_eq!(words.last().unwrap().end, 3.37);
    assert!(words.windows(2).all(|w| w[0].end <= w[1].start + 1e-9));
}

#[test]
fn given_confidence_when_spreading_then_it_is_rounded_to_three_decimals() {
    let words = WordTiming::spread("hello", 0.0, 1.0, 0.123456);

    assert_eq!(words[0].confidence, 0.123);
}

#[test]
fn given_blank_text_when_spreading_then_returns_no_words() {
    assert!(WordTiming::spread("   ", 0.0, 1.0, 1.0).is_empty());
}

#[test]
fn given_segments_when_building_transcript_then_text_joins_trimmed_segments() {
    let transcript = Transcript::from_segments(
        "en",
        vec![segment(0, 0.0, 1.0, " Hello there."), segment(1, 1.0, 2.5, " General Kenobi. ")],
    );

    assert_eq!(transcript.text, "Hello there. General Kenobi.");
    assert_eq!(transcript.language, "en");
    assert_eq!(transcript.word_count(), 4);
    assert_eq!(transcript.duration(), 2.5);
}

#[test]
fn given_no_segments_when_building_transcript_then_is_empty() {
    let transcript = Transcript::from_segments("fr", Vec::new());

    assert!(transcript.text.is_empty());
    assert_eq!(transcript.duration(), 0.0);
    assert_eq!(transcript.word_count(), 0);
}

#[test]
fn given_transcript_when_serializing_then_uses_documented_field_names() {
    let transcript = Transcript::from_segments("en", vec![segment(0, 0.0, 1.0, "hi")]);

    let json = serde_json::to_value(&transcript).unwrap();

    let segment = &json["segments"][0];
    for field in [
        "id",
        "seek",
        "start",
        "end",
        "text",
        "tokens",
        "temperature",
        "avg_logprob",
        "compression_ratio",
        "no_speech_prob",
        "confidence",
    ] {
        assert!(segment.get(field).is_some(), "missing {field}");
    }
    let word = &segment["words"][0];
    for field in ["text", "start", "end", "confidence"] {
        assert!(word.get(field).is_some(), "missing {field}");
    }
}

#[test]
fn given_mean_logprob_when_deriving_confidence_then_it_is_a_rounded_probability() {
    assert_eq!(Segment::confidence_from_logprob(0.0), 1.0);
    assert_eq!(Segment::confidence_from_logprob(-0.2), 0.819);
    assert_eq!(Segment::confidence_from_logprob(f64::NEG_INFINITY), 0.0);
}
