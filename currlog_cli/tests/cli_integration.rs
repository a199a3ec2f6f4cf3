use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal fast config for the simulated backend
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = format!(
        r#"
[pins]
# pins are unused by the simulated backend but must be present
status_led = 21
bar_leds = [20, 5, 6, 13, 19, 26]
button = 25
buzzer = 12

[display]
echo_every = 1

[alert]
overcurrent_a = 30.0
pulse_ms = 1
cooldown_ms = 5
startup_pulse_ms = 1

[storage]
mount_path = "{}"

[timing]
loop_ms = 10
recorder_tick_ms = 10
button_poll_ms = 5
debounce_settle_ms = 5
startup_ms = 10
fail_blink_ms = 1
"#,
        dir.path().display()
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn currlog() -> Command {
    let mut cmd = Command::cargo_bin("currlog").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("CURRLOG_SIM_FAULT");
    cmd
}

#[rstest]
#[case(&["--self-check"], 0, "self-check OK", "stdout")]
#[case(&["--self-check", "7"], 0, "self-check OK", "stdout")]
#[case(&["--self-check", "0"], 0, "ignoring zero per-LED step", "stderr")]
#[case(&["--run-ms", "300", "debug"], 0, "Current:", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = currlog();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn help_lists_flags() {
    currlog()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--self-check"));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = tempdir().unwrap();
    currlog()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("--self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("What happened: Invalid configuration"));
}

#[test]
fn out_of_range_value_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "[pins]\nstatus_led = 21\nbar_leds = [20]\nbutton = 25\n\n[adc]\nchannels = 9\n",
    )
    .unwrap();
    currlog()
        .arg("--config")
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("adc.channels must be in 1..=4"));
}

#[test]
fn run_without_debug_prints_no_echo() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    currlog()
        .arg("--config")
        .arg(&cfg)
        .arg("--run-ms")
        .arg("100")
        .arg("bogus")
        .assert()
        .success()
        .stdout(predicate::str::contains("Current:").not())
        .stderr(predicate::str::contains("ignoring unrecognized argument"));
}

#[test]
fn shipped_config_self_checks_in_simulation() {
    let cfg = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../etc/currlog.toml");
    currlog()
        .arg("--config")
        .arg(cfg)
        .arg("--self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("self-check OK"));
}
