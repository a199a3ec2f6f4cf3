//! Controller behaviour against live workers and recording fakes.

use currlog_core::mocks::{
    CountingNotifier, ManualWallClock, RecordingEject, RecordingLine, ScriptedButton,
    ScriptedTransport,
};
use currlog_core::{
    AdcCfg, AlertCfg, ButtonAction, Clocks, Controller, Devices, DisplayCfg, EngineCfg,
    NotifyTarget, RecorderCfg, Timing,
};
use currlog_traits::{MonotonicClock, OutputLine};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

struct Rig {
    ctl: Controller,
    transport: ScriptedTransport,
    status: RecordingLine,
    bar: Vec<RecordingLine>,
    buzzer: RecordingLine,
    button: ScriptedButton,
    eject: RecordingEject,
    notifier: CountingNotifier,
}

fn cfg(dir: &Path) -> EngineCfg {
    let ms = Duration::from_millis;
    EngineCfg {
        adc: AdcCfg {
            poll: ms(2),
            ..AdcCfg::default()
        },
        display: DisplayCfg::default(),
        alert: AlertCfg {
            overcurrent_a: Some(30.0),
            pulse: ms(1),
            cooldown: ms(1),
            startup_pulse: ms(1),
            ..AlertCfg::default()
        },
        recorder: RecorderCfg {
            mount_path: dir.to_path_buf(),
            ..RecorderCfg::default()
        },
        notify: Some(NotifyTarget {
            device: "192.168.1.20".into(),
            media_url: "http://host/alarm.mp3".into(),
        }),
        timing: Timing {
            loop_period: ms(1),
            recorder_tick: ms(2),
            button_poll: ms(1),
            debounce_settle: ms(1),
            startup: ms(1),
            fail_blink: ms(1),
        },
        ..EngineCfg::default()
    }
}

fn rig(dir: &Path, code: i16) -> Rig {
    rig_with(dir, ScriptedTransport::with_codes(vec![code]))
}

fn rig_with(dir: &Path, transport: ScriptedTransport) -> Rig {
    let status = RecordingLine::new();
    let bar: Vec<RecordingLine> = (0..6).map(|_| RecordingLine::new()).collect();
    let buzzer = RecordingLine::new();
    let button = ScriptedButton::new();
    let eject = RecordingEject::new();
    let notifier = CountingNotifier::new();
    let devices = Devices {
        transport: Box::new(transport.clone()),
        status_led: Box::new(status.clone()),
        bar_leds: bar
            .iter()
            .map(|l| Box::new(l.clone()) as Box<dyn OutputLine + Send>)
            .collect(),
        buzzer: Some(Box::new(buzzer.clone())),
        button: Box::new(button.clone()),
        eject: Box::new(eject.clone()),
        notifier: Some(Arc::new(notifier.clone())),
    };
    let clocks = Clocks {
        mono: Arc::new(MonotonicClock::new()),
        wall: Arc::new(ManualWallClock::parse("2024-05-01 10:00:00")),
    };
    let ctl = Controller::start(devices, cfg(dir), clocks).unwrap();
    Rig {
        ctl,
        transport,
        status,
        bar,
        buzzer,
        button,
        eject,
        notifier,
    }
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

fn wait_for_amps(ctl: &Controller, amps: f64) {
    assert!(
        wait_for(|| (ctl.readings().latest().amps[0] - amps).abs() < 1e-9),
        "reading never reached {amps}"
    );
}

#[test]
fn step_drives_bar_and_alerts_on_rising_edge_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut r = rig(dir.path(), 1000);
    wait_for_amps(&r.ctl, 20.821766);

    let rep = r.ctl.step();
    assert_eq!(rep.lit, 4);
    assert!(!rep.overcurrent);
    let lit: Vec<bool> = r.bar.iter().map(RecordingLine::is_high).collect();
    assert_eq!(lit, vec![true, true, true, true, false, false]);

    // 1500 -> 31.232649 A, above the 30 A limit
    r.transport.set_codes(vec![1500]);
    wait_for_amps(&r.ctl, 31.232649);
    let rep = r.ctl.step();
    assert!(rep.overcurrent);
    assert!(rep.notified);
    assert_eq!(rep.lit, 6);
    let rep = r.ctl.step();
    assert!(rep.overcurrent);
    assert!(!rep.notified);
    assert!(wait_for(|| r.buzzer.rising_edges() >= 3));
    assert!(wait_for(|| r.notifier.calls() == 1));

    r.transport.set_codes(vec![1000]);
    wait_for_amps(&r.ctl, 20.821766);
    let rep = r.ctl.step();
    assert!(!rep.overcurrent);
    r.ctl.shutdown();
    assert!(!r.buzzer.is_high());
    assert_eq!(r.notifier.calls(), 1);
}

#[test]
fn button_toggles_recording_and_releases_on_disarm() {
    let dir = tempfile::tempdir().unwrap();
    let mut r = rig(dir.path(), 1000);
    let stop = AtomicBool::new(false);

    assert_eq!(r.ctl.poll_button(&stop), None);

    r.button.press_for(5);
    assert_eq!(r.ctl.poll_button(&stop), Some(ButtonAction::Armed));
    // held for five polls, then released
    assert!(r.button.polls() >= 6);
    assert!(wait_for(|| r.ctl.is_armed()));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

    r.button.press_for(1);
    assert_eq!(r.ctl.poll_button(&stop), Some(ButtonAction::Disarmed));
    assert!(wait_for(|| r.eject.releases() == 1));
    assert!(wait_for(|| !r.ctl.is_armed()));
}

#[test]
fn run_until_stopped_then_releases_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let mut r = rig(dir.path(), 1000);
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        flag.store(true, Ordering::Relaxed);
    });
    r.ctl.run(&stop);
    stopper.join().unwrap();

    // startup lit the whole bar once
    assert!(r.bar.iter().all(|l| l.levels().first() == Some(&true)));
    assert!(r.bar.iter().all(|l| !l.is_high()));
    assert!(!r.status.is_high());
    assert!(!r.buzzer.is_high());
    assert!(r.buzzer.rising_edges() >= 1);
    assert_eq!(r.eject.releases(), 0);

    // shutdown is idempotent
    r.ctl.shutdown();
}

#[test]
fn transport_fault_blinks_status_without_stopping_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::with_codes(vec![1000]);
    transport.fail_next_writes(2);
    let mut r = rig_with(dir.path(), transport);
    assert!(wait_for(|| r.ctl.readings().latest().seq > 0));
    assert_eq!(r.ctl.status().fail_safe_bursts(), 2);
    assert!(r.status.levels().contains(&false));
    let rep = r.ctl.step();
    assert_eq!(rep.lit, 4);
}
