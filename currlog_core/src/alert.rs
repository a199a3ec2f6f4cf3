//! Buzzer driver with two independent triggers.
//!
//! A sustained request (overcurrent) plays `pulses` short beeps followed by a
//! cool-down, re-evaluated every cycle from the latest flag. A one-shot request
//! holds the buzzer on for its duration once and is then cleared. When both are
//! pending the sustained cycle runs first.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use currlog_traits::{Clock, OutputLine};

use crate::config::AlertCfg;
use crate::error::Result;
use crate::worker::Worker;

/// How long an idle alerter waits for a command before re-checking its stop flag.
const IDLE_WAIT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertRequest {
    pub sustained: bool,
    /// Zero when nothing is pending.
    pub one_shot: Duration,
}

impl AlertRequest {
    pub fn is_idle(&self) -> bool {
        !self.sustained && self.one_shot.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertCommand {
    SetSustained(bool),
    OneShot(Duration),
    Stop,
}

/// Output line that does nothing; stands in for an unconfigured buzzer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl OutputLine for Silent {
    fn set(&mut self, _high: bool) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

pub struct Alerter<L: OutputLine> {
    buzzer: L,
    cfg: AlertCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    request: AlertRequest,
}

impl<L: OutputLine> Alerter<L> {
    pub fn new(buzzer: L, cfg: AlertCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            buzzer,
            cfg,
            clock,
            request: AlertRequest::default(),
        }
    }

    pub fn request(&self) -> AlertRequest {
        self.request
    }

    /// Apply one command; returns `false` for `Stop`.
    pub fn apply(&mut self, cmd: AlertCommand) -> bool {
        match cmd {
            AlertCommand::SetSustained(on) => self.request.sustained = on,
            AlertCommand::OneShot(d) => self.request.one_shot = d,
            AlertCommand::Stop => return false,
        }
        true
    }

    fn drive(&mut self, high: bool) {
        if let Err(e) = self.buzzer.set(high) {
            tracing::warn!(error = %e, "buzzer write failed");
        }
    }

    /// One beep pattern plus cool-down, if the sustained flag is set.
    pub fn sustained_cycle(&mut self) -> bool {
        if !self.request.sustained {
            return false;
        }
        for _ in 0..self.cfg.pulses {
            self.drive(true);
            self.clock.sleep(self.cfg.pulse);
            self.drive(false);
            self.clock.sleep(self.cfg.pulse);
        }
        self.clock.sleep(self.cfg.cooldown);
        true
    }

    /// Honor a pending one-shot request and clear it.
    pub fn one_shot_cycle(&mut self) -> bool {
        let d = self.request.one_shot;
        if d.is_zero() {
            return false;
        }
        self.drive(true);
        self.clock.sleep(d);
        self.drive(false);
        self.request.one_shot = Duration::ZERO;
        true
    }
}

impl<L: OutputLine + Send + 'static> Alerter<L> {
    pub fn spawn(mut self) -> Result<AlertHandle> {
        let (tx, rx) = xch::unbounded::<AlertCommand>();
        let worker = Worker::spawn("alert", move |stop| {
            'run: while !stop.load(Ordering::Relaxed) {
                for cmd in rx.try_iter() {
                    if !self.apply(cmd) {
                        break 'run;
                    }
                }
                self.sustained_cycle();
                // a one-shot issued during the pattern runs right after it
                for cmd in rx.try_iter() {
                    if !self.apply(cmd) {
                        break 'run;
                    }
                }
                self.one_shot_cycle();
                if self.request.is_idle() {
                    match rx.recv_timeout(IDLE_WAIT) {
                        Ok(cmd) => {
                            if !self.apply(cmd) {
                                break;
                            }
                        }
                        Err(xch::RecvTimeoutError::Timeout) => {}
                        Err(xch::RecvTimeoutError::Disconnected) => break,
                    }
                }
            }
            self.drive(false);
        })?;
        Ok(AlertHandle { tx, worker })
    }
}

pub struct AlertHandle {
    tx: xch::Sender<AlertCommand>,
    worker: Worker,
}

impl AlertHandle {
    pub fn set_sustained(&self, on: bool) {
        self.send(AlertCommand::SetSustained(on));
    }

    pub fn one_shot(&self, d: Duration) {
        self.send(AlertCommand::OneShot(d));
    }

    fn send(&self, cmd: AlertCommand) {
        if self.tx.send(cmd).is_err() {
            tracing::warn!(?cmd, "alert thread is gone");
        }
    }

    /// Silence the buzzer and wait for the thread to exit.
    pub fn stop(&mut self) {
        let _ = self.tx.send(AlertCommand::Stop);
        self.worker.join();
    }
}
