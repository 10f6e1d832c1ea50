//! Token table loading and rendering tests.

use std::fs;

use capbeam_common::{TokenId, TokenTable, VocabError, Vocabulary};
use proptest::prelude::*;

#[test]
fn loads_from_json_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vocab.json");
    fs::write(&path, r#"{"words": ["<start>", "a", "dog", "runs", "."], "start": "<start>", "stop": "."}"#)
        .unwrap();

    let vocab = Vocabulary::from_json_file(&path).expect("load");
    assert_eq!(vocab.len(), 5);
    assert_eq!(vocab.start_token(), 0);
    assert_eq!(vocab.stop_token(), 4);
    assert_eq!(vocab.render(&[1, 2, 3, 4]).sentence, "a dog runs.");
}

#[test]
fn json_missing_field_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vocab.json");
    fs::write(&path, r#"{"words": ["a", "."], "stop": "."}"#).unwrap();
    assert!(matches!(Vocabulary::from_json_file(&path), Err(VocabError::Json(_))));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Vocabulary::from_json_file(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, VocabError::Io(_)));
}

fn small_vocab() -> Vocabulary {
    let words = ["<s>", "a", "b", "c", "."].iter().map(|w| (*w).to_string()).collect();
    Vocabulary::new(words, "<s>", ".").unwrap()
}

proptest! {
    /// Rendered length never exceeds the input and stops right after the first stop token.
    #[test]
    fn render_length_stops_at_first_stop(tokens in prop::collection::vec(0u32..6, 0..30)) {
        let vocab = small_vocab();
        let rendered = vocab.render(&tokens);
        let stop: TokenId = vocab.stop_token();
        let expected = tokens.iter().position(|&t| t == stop).map_or(tokens.len(), |p| p + 1);
        prop_assert_eq!(rendered.length, expected);
        prop_assert!(!rendered.sentence.contains("<s>"));
    }
}
