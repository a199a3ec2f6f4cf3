#![cfg(unix)]

use std::path::Path;
use std::time::{Duration, Instant};

use currlog_hardware::{CommandEject, CommandNotifier};
use currlog_traits::{Notifier, StorageEject};
use rstest::rstest;

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[rstest]
#[case(&["true"], true)]
#[case(&["false"], false)]
fn eject_reports_exit_status(#[case] cmd: &[&str], #[case] ok: bool) {
    let mut eject = CommandEject::new(&argv(cmd)).unwrap();
    let res = eject.release(Path::new("/tmp/not-a-mount"));
    assert_eq!(res.is_ok(), ok, "unexpected result: {res:?}");
}

#[test]
fn notifier_succeeds_for_fast_helper() {
    let n = CommandNotifier::new(argv(&["true", "{device}", "{url}"]), Duration::from_secs(2))
        .unwrap();
    n.announce("kitchen", "http://host/a.mp3").unwrap();
}

#[test]
fn notifier_kills_slow_helper_after_timeout() {
    let n = CommandNotifier::new(argv(&["sleep", "5"]), Duration::from_millis(100)).unwrap();
    let start = Instant::now();
    let err = n.announce("kitchen", "http://host/a.mp3").expect_err("should time out");
    assert!(err.to_string().contains("timed out"), "got: {err}");
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn notifier_missing_program_is_an_error() {
    let n = CommandNotifier::new(
        argv(&["/nonexistent/announce-helper"]),
        Duration::from_millis(100),
    )
    .unwrap();
    assert!(n.announce("kitchen", "http://host/a.mp3").is_err());
}
