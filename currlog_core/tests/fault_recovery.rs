//! Sensor worker recovery after transport faults.
//!
//! After N consecutive failures the next successful handshake moves the
//! worker to Ready and readings resume; the status LED bursts exactly once
//! per failed cycle.

use currlog_core::mocks::{ManualClock, NoopTransport, RecordingLine, ScriptedTransport};
use currlog_core::{
    AdcCfg, BlinkPattern, Calibration, PollOutcome, SensorPoller, SharedReadings, StatusLed,
    TransportState,
};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

fn fixture<T: currlog_traits::Transport>(
    transport: T,
) -> (SensorPoller<T>, SharedReadings, StatusLed, RecordingLine) {
    let line = RecordingLine::new();
    let status = StatusLed::new(Box::new(line.clone()));
    let readings = SharedReadings::new(1);
    let poller = SensorPoller::new(
        transport,
        AdcCfg::default(),
        Calibration::default(),
        readings.clone(),
        status.clone(),
        BlinkPattern::transport(Duration::from_millis(100)),
        Arc::new(ManualClock::new()),
    );
    (poller, readings, status, line)
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(10)]
fn n_handshake_failures_then_ready(#[case] failures: u32) {
    let t = ScriptedTransport::with_codes(vec![4096]);
    t.fail_next_writes(failures);
    let (mut p, readings, status, _) = fixture(t);

    for i in 1..=failures {
        assert!(matches!(p.poll_once(), PollOutcome::HandshakeFailed(_)));
        assert_eq!(p.state(), TransportState::Faulted);
        assert_eq!(status.fail_safe_bursts(), u64::from(i));
    }
    assert_eq!(readings.latest().seq, 0);

    assert_eq!(p.poll_once(), PollOutcome::Published(1));
    assert_eq!(p.state(), TransportState::Ready);
    assert!((readings.latest().amps[0] - 85.285952).abs() < 1e-9);

    // healthy cycles emit no further bursts
    assert_eq!(p.poll_once(), PollOutcome::Published(2));
    assert_eq!(status.fail_safe_bursts(), u64::from(failures));
}

#[test]
fn read_failure_after_ready_recovers_next_cycle() {
    let t = ScriptedTransport::with_codes(vec![1000]);
    let (mut p, readings, status, _) = fixture(t.clone());
    assert_eq!(p.poll_once(), PollOutcome::Published(1));

    t.fail_next_reads(2);
    assert!(matches!(p.poll_once(), PollOutcome::ReadFailed { channel: 0, .. }));
    assert!(matches!(p.poll_once(), PollOutcome::ReadFailed { channel: 0, .. }));
    assert_eq!(status.fail_safe_bursts(), 2);
    assert_eq!(readings.latest().seq, 1);

    assert_eq!(p.poll_once(), PollOutcome::Published(2));
    assert_eq!(p.state(), TransportState::Ready);
}

#[test]
fn burst_is_a_fixed_blink_that_ends_lit() {
    let (mut p, _, status, line) = fixture(NoopTransport);
    p.poll_once();
    assert_eq!(
        line.levels(),
        vec![false, true, false, true, false, true]
    );
    assert!(status.is_on());
}

#[test]
fn worker_thread_keeps_retrying_and_stops_on_drop() {
    let t = ScriptedTransport::with_codes(vec![1000]);
    t.fail_next_writes(3);
    let status = StatusLed::new(Box::new(RecordingLine::new()));
    let readings = SharedReadings::new(1);
    let adc = AdcCfg {
        poll: Duration::from_millis(2),
        ..AdcCfg::default()
    };
    let worker = SensorPoller::new(
        t,
        adc,
        Calibration::default(),
        readings.clone(),
        status.clone(),
        BlinkPattern::transport(Duration::from_millis(1)),
        Arc::new(currlog_traits::MonotonicClock::new()),
    )
    .spawn()
    .unwrap();

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while readings.latest().seq == 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    drop(worker);
    assert!(readings.latest().seq >= 1);
    assert_eq!(status.fail_safe_bursts(), 3);
}
