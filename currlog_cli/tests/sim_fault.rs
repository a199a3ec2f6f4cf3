//! A disconnected ADC surfaces as a hardware error (exit code 3), both as
//! human text and as structured JSON.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("cfg.toml");
    fs::write(
        &path,
        "[pins]\nstatus_led = 21\nbar_leds = [20, 5]\nbutton = 25\n\n[timing]\nfail_blink_ms = 1\n",
    )
    .unwrap();
    path
}

#[test]
fn self_check_fails_with_hardware_exit_code() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("currlog").unwrap();
    cmd.env("CURRLOG_SIM_FAULT", "1")
        .arg("--config")
        .arg(config(&dir))
        .arg("--self-check");
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains(
            "What happened: The current sensor ADC did not respond",
        ));
}

#[test]
fn json_mode_prints_structured_error() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("currlog").unwrap();
    cmd.env("CURRLOG_SIM_FAULT", "1")
        .arg("--config")
        .arg(config(&dir))
        .arg("--json")
        .arg("--self-check");
    let out = cmd.assert().code(3).get_output().stdout.clone();
    let text = String::from_utf8(out).unwrap();
    let line = text
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .expect("json error line");
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "Transport");
    assert_eq!(v["exit_code"], 3);
    assert!(v["message"].as_str().unwrap().contains("i2cdetect"));
}
