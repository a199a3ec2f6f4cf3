//! The control loop: bar display, overcurrent alerting, the arm/disarm
//! button and orderly startup and shutdown of the workers.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use currlog_traits::{
    Clock, InputLine, LocalWallClock, MonotonicClock, Notifier, OutputLine, StorageEject,
    Transport, WallClock,
};

use crate::alert::{AlertHandle, Alerter, Silent};
use crate::bar::{LedBar, lit_count};
use crate::config::EngineCfg;
use crate::error::Result;
use crate::indicator::{BlinkPattern, StatusLed};
use crate::notify::NotifyDispatcher;
use crate::recorder::{Recorder, RecorderHandle};
use crate::sensor::SensorPoller;
use crate::snapshot::SharedReadings;
use crate::worker::Worker;

/// Every device the engine drives.
pub struct Devices {
    pub transport: Box<dyn Transport + Send>,
    pub status_led: Box<dyn OutputLine + Send>,
    pub bar_leds: Vec<Box<dyn OutputLine + Send>>,
    /// `None` runs the alert worker against a silent line.
    pub buzzer: Option<Box<dyn OutputLine + Send>>,
    pub button: Box<dyn InputLine + Send>,
    pub eject: Box<dyn StorageEject + Send>,
    pub notifier: Option<Arc<dyn Notifier + Send + Sync>>,
}

#[derive(Clone)]
pub struct Clocks {
    pub mono: Arc<dyn Clock + Send + Sync>,
    pub wall: Arc<dyn WallClock + Send + Sync>,
}

impl Default for Clocks {
    fn default() -> Self {
        Self {
            mono: Arc::new(MonotonicClock::new()),
            wall: Arc::new(LocalWallClock),
        }
    }
}

/// What one control cycle observed and did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub amps: f64,
    pub lit: usize,
    pub overcurrent: bool,
    /// An announcement was requested this cycle.
    pub notified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Armed,
    Disarmed,
}

pub struct Controller {
    cfg: EngineCfg,
    readings: SharedReadings,
    status: StatusLed,
    bar: LedBar,
    button: Box<dyn InputLine + Send>,
    clock: Arc<dyn Clock + Send + Sync>,
    sensor: Worker,
    recorder: RecorderHandle,
    alert: AlertHandle,
    notify: Option<NotifyDispatcher>,
    overcurrent: bool,
    cycles: u64,
    stopped: bool,
}

impl Controller {
    /// Spawn the sensor, recorder and alert workers.
    pub fn start(devices: Devices, cfg: EngineCfg, clocks: Clocks) -> Result<Self> {
        let status = StatusLed::new(devices.status_led);
        let readings = SharedReadings::new(cfg.adc.channels);
        let blink = cfg.timing.fail_blink;

        let sensor = SensorPoller::new(
            devices.transport,
            cfg.adc.clone(),
            cfg.calibration,
            readings.clone(),
            status.clone(),
            BlinkPattern::transport(blink),
            clocks.mono.clone(),
        )
        .spawn()?;

        let recorder = Recorder::new(
            cfg.recorder.clone(),
            readings.clone(),
            status.clone(),
            BlinkPattern::storage(blink),
            devices.eject,
            clocks.wall.clone(),
            clocks.mono.clone(),
        )
        .spawn(cfg.timing.recorder_tick)?;

        let buzzer: Box<dyn OutputLine + Send> = match devices.buzzer {
            Some(b) => b,
            None => Box::new(Silent),
        };
        let alert = Alerter::new(buzzer, cfg.alert.clone(), clocks.mono.clone()).spawn()?;

        let notify = match (cfg.notify.clone(), devices.notifier) {
            (Some(target), Some(notifier)) => Some(NotifyDispatcher::new(notifier, target)),
            (Some(_), None) => {
                tracing::warn!("notification target configured without a notifier");
                None
            }
            _ => None,
        };

        tracing::info!(
            channels = cfg.adc.channels,
            leds = devices.bar_leds.len(),
            "workers started"
        );
        Ok(Self {
            readings,
            status,
            bar: LedBar::new(devices.bar_leds),
            button: devices.button,
            clock: clocks.mono,
            sensor,
            recorder,
            alert,
            notify,
            overcurrent: false,
            cycles: 0,
            stopped: false,
            cfg,
        })
    }

    pub fn readings(&self) -> &SharedReadings {
        &self.readings
    }

    pub fn status(&self) -> &StatusLed {
        &self.status
    }

    pub fn is_armed(&self) -> bool {
        self.recorder.is_armed()
    }

    /// Attention sequence: all LEDs and a short beep.
    pub fn startup(&mut self) {
        self.status.steady();
        self.bar.all_on();
        self.alert.one_shot(self.cfg.alert.startup_pulse);
        self.clock.sleep(self.cfg.timing.startup);
        self.bar.clear();
    }

    /// One display and alerting cycle against the latest reading set.
    pub fn step(&mut self) -> StepReport {
        let snapshot = self.readings.latest();
        let amps = snapshot.select(self.cfg.display.channel);
        self.cycles = self.cycles.wrapping_add(1);

        if self.cfg.display.echo
            && self.cfg.display.echo_every > 0
            && self.cycles % u64::from(self.cfg.display.echo_every) == 0
        {
            let prec = usize::from(self.cfg.calibration.decimals);
            println!("Current: {amps:.prec$} A");
        }

        let lit = lit_count(
            amps,
            self.cfg.display.amp_per_led,
            self.bar.len(),
            self.cfg.display.boundary,
        );
        self.bar.show(lit);

        let over = self.cfg.alert.overcurrent_a.is_some_and(|limit| amps > limit);
        let mut notified = false;
        if over != self.overcurrent {
            self.alert.set_sustained(over);
            if over {
                tracing::warn!(amps, limit = ?self.cfg.alert.overcurrent_a, "overcurrent");
                if let Some(n) = &self.notify {
                    n.dispatch();
                    notified = true;
                }
            } else {
                tracing::info!(amps, "current back below limit");
            }
            self.overcurrent = over;
        }

        StepReport {
            amps,
            lit,
            overcurrent: over,
            notified,
        }
    }

    fn button_active(&mut self) -> bool {
        match self.button.is_active() {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!(error = %e, "button read failed");
                false
            }
        }
    }

    /// Debounced arm/disarm toggle. Blocks while the button is held.
    pub fn poll_button(&mut self, stop: &AtomicBool) -> Option<ButtonAction> {
        if !self.button_active() {
            return None;
        }
        while !stop.load(Ordering::Relaxed) && self.button_active() {
            self.clock.sleep(self.cfg.timing.button_poll);
        }
        self.clock.sleep(self.cfg.timing.debounce_settle);
        if self.recorder.is_armed() {
            tracing::info!("button: disarm");
            self.recorder.disarm(true);
            Some(ButtonAction::Disarmed)
        } else {
            tracing::info!("button: arm");
            self.recorder.arm();
            Some(ButtonAction::Armed)
        }
    }

    /// Run the loop until `stop` is set, then shut down.
    pub fn run(&mut self, stop: &AtomicBool) {
        self.startup();
        while !stop.load(Ordering::Relaxed) {
            self.step();
            self.poll_button(stop);
            self.clock.sleep(self.cfg.timing.loop_period);
        }
        tracing::info!("stop requested");
        self.shutdown();
    }

    /// Stop each worker in turn, then release the indicators. Idempotent.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.sensor.join();
        self.recorder.stop();
        self.alert.stop();
        self.bar.clear();
        self.status.set(false);
        tracing::info!("shutdown complete");
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}
