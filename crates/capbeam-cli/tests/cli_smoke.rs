use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn demo(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos").join(file)
}

fn capbeam() -> Command {
    let mut cmd = Command::cargo_bin("capbeam").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("CAPBEAM_BEAM_SIZE")
        .env_remove("CAPBEAM_MAX_CAPTION_LEN")
        .env_remove("CAPBEAM_BATCH_SIZE")
        .env_remove("CAPBEAM_LOG_LEVEL")
        .env_remove("CAPBEAM_LOG_FORMAT");
    cmd
}

#[test]
fn help_works() {
    capbeam().arg("--help").assert().success();
}

#[test]
fn version_works() {
    capbeam().arg("--version").assert().success();
}

#[test]
fn help_mentions_core_subcommands() {
    let out = capbeam().arg("--help").assert().success().get_output().stdout.clone();
    let s = String::from_utf8(out).unwrap();
    for needle in ["decode", "config", "--config", "--log-level"] {
        assert!(s.contains(needle), "help missing `{needle}`");
    }
}

#[test]
fn invalid_command_fails() {
    capbeam().arg("nonexistent-command").assert().failure();
}

#[test]
fn invalid_log_level_fails() {
    capbeam().args(["--log-level", "loud", "config", "show"]).assert().failure();
}

#[test]
fn config_show_reads_file_then_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capbeam.toml");
    std::fs::write(&path, "[decode]\nbeam_size = 5\n").unwrap();

    capbeam()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("beam_size = 5"))
        .stdout(predicate::str::contains("max_caption_length = 20"));

    capbeam()
        .arg("--config")
        .arg(&path)
        .env("CAPBEAM_BEAM_SIZE", "7")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("beam_size = 7"));
}

#[test]
fn decode_demo_prints_one_line_per_input() {
    let out = capbeam()
        .arg("--config")
        .arg(demo("capbeam.toml"))
        .arg("decode")
        .arg("--model")
        .arg(demo("model.json"))
        .arg("--vocab")
        .arg(demo("vocab.json"))
        .args(["--inputs", "img-1,img-dog,img-3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let s = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = s.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("img-1\ta cat on the mat."), "unexpected line: {}", lines[0]);
    assert!(lines[1].starts_with("img-dog\ta dog."), "unexpected line: {}", lines[1]);
}

#[test]
fn decode_json_reports_captions_and_stats() {
    let out = capbeam()
        .arg("--config")
        .arg(demo("capbeam.toml"))
        .arg("decode")
        .arg("--model")
        .arg(demo("model.json"))
        .arg("--vocab")
        .arg(demo("vocab.json"))
        .args(["--inputs", "img-1,img-2", "--beam-size", "1", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["captions"].as_array().unwrap().len(), 2);
    assert_eq!(json["stats"]["examples"], 2);
    assert_eq!(json["captions"][0]["id"], "img-1");
    assert_eq!(json["captions"][0]["completed"], true);
}

#[test]
fn decode_with_missing_model_names_the_file() {
    capbeam()
        .arg("--config")
        .arg(demo("capbeam.toml"))
        .arg("decode")
        .args(["--model", "does-not-exist.json"])
        .arg("--vocab")
        .arg(demo("vocab.json"))
        .args(["--inputs", "img-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.json"));
}

#[test]
fn decode_rejects_zero_beam_size() {
    capbeam()
        .arg("--config")
        .arg(demo("capbeam.toml"))
        .arg("decode")
        .arg("--model")
        .arg(demo("model.json"))
        .arg("--vocab")
        .arg(demo("vocab.json"))
        .args(["--inputs", "img-1", "--beam-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("beam_size"));
}
