//! File-based configuration tests for `capbeam-common`.

use std::fs;

use capbeam_common::{CaptionConfig, ConfigError, LogFormat, LogLevel};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = CaptionConfig::from_toml(&dir.path().join("absent.toml")).expect("defaults");
    assert_eq!(cfg, CaptionConfig::default());
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("capbeam.toml");
    fs::write(&path, "[decode]\nbeam_size = 5\n\n[logging]\nformat = \"compact\"\n").unwrap();

    let cfg = CaptionConfig::from_toml(&path).expect("parse");
    assert_eq!(cfg.decode.beam_size, 5);
    assert_eq!(cfg.decode.max_caption_length, 20);
    assert_eq!(cfg.logging.format, LogFormat::Compact);
    assert_eq!(cfg.logging.level, LogLevel::Info);
}

#[test]
fn toml_roundtrip_preserves_everything() {
    let mut cfg = CaptionConfig::default();
    cfg.decode.beam_size = 7;
    cfg.decode.batch_size = 2;
    cfg.logging.level = LogLevel::Trace;

    let text = cfg.to_toml().expect("serialize");
    assert!(text.contains("[decode]"));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("roundtrip.toml");
    fs::write(&path, text).unwrap();
    assert_eq!(CaptionConfig::from_toml(&path).unwrap(), cfg);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[decode\nbeam_size = ").unwrap();
    assert!(matches!(CaptionConfig::from_toml(&path), Err(ConfigError::TomlParse(_))));
}

#[test]
fn unknown_log_level_in_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("level.toml");
    fs::write(&path, "[logging]\nlevel = \"loud\"\n").unwrap();
    assert!(CaptionConfig::from_toml(&path).is_err());
}
