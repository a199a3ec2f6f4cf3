//! Configuration types for the logging engine.
//!
//! These are the runtime configuration structs used by the workers.
//! They are separate from the TOML-deserialized config in `currlog_config`.

use std::path::PathBuf;
use std::time::Duration;

use crate::calibration::Calibration;

/// Converter addressing and polling.
#[derive(Debug, Clone)]
pub struct AdcCfg {
    pub address: u8,
    /// Base configuration byte; bits 5..6 are replaced by the channel number.
    pub config_byte: u8,
    pub channels: usize,
    /// Wait between channel select and read.
    pub settle: Duration,
    /// Sensor worker cycle period.
    pub poll: Duration,
}

impl AdcCfg {
    const CHANNEL_MASK: u8 = 0b0110_0000;

    /// Configuration byte selecting `channel` (0-based).
    #[inline]
    pub fn channel_config(&self, channel: usize) -> u8 {
        let ch = (channel as u8) & 0b11;
        (self.config_byte & !Self::CHANNEL_MASK) | (ch << 5)
    }
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self {
            address: 0x68,
            config_byte: 0b1001_1000,
            channels: 1,
            settle: Duration::ZERO,
            poll: Duration::from_millis(100),
        }
    }
}

/// Comparison used when deciding whether a bar LED is lit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Boundary {
    /// LED n lit iff current > n * step.
    #[default]
    Strict,
    /// LED n lit iff current >= n * step.
    Inclusive,
}

/// Which reading drives the bar and the overcurrent alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelPolicy {
    #[default]
    First,
    Max,
    Index(usize),
}

#[derive(Debug, Clone)]
pub struct DisplayCfg {
    pub amp_per_led: f64,
    pub boundary: Boundary,
    pub channel: ChannelPolicy,
    /// Print the primary current to stdout every `echo_every` cycles.
    pub echo: bool,
    pub echo_every: u32,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            amp_per_led: 5.0,
            boundary: Boundary::Strict,
            channel: ChannelPolicy::First,
            echo: false,
            echo_every: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertCfg {
    /// `None` disables overcurrent alerting.
    pub overcurrent_a: Option<f64>,
    pub pulse: Duration,
    pub pulses: u8,
    pub cooldown: Duration,
    pub startup_pulse: Duration,
}

impl Default for AlertCfg {
    fn default() -> Self {
        Self {
            overcurrent_a: None,
            pulse: Duration::from_millis(100),
            pulses: 3,
            cooldown: Duration::from_millis(1000),
            startup_pulse: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecorderCfg {
    pub mount_path: PathBuf,
    pub extension: String,
    pub channels: usize,
    pub decimals: u8,
}

impl Default for RecorderCfg {
    fn default() -> Self {
        Self {
            mount_path: PathBuf::from("/media/pi/MYUSB"),
            extension: "csv".into(),
            channels: 1,
            decimals: 6,
        }
    }
}

/// Where overcurrent announcements go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyTarget {
    pub device: String,
    pub media_url: String,
}

#[derive(Debug, Clone)]
pub struct Timing {
    pub loop_period: Duration,
    pub recorder_tick: Duration,
    pub button_poll: Duration,
    pub debounce_settle: Duration,
    pub startup: Duration,
    /// Half period of the fail-safe blink.
    pub fail_blink: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            loop_period: Duration::from_millis(100),
            recorder_tick: Duration::from_millis(50),
            button_poll: Duration::from_millis(50),
            debounce_settle: Duration::from_millis(200),
            startup: Duration::from_millis(1000),
            fail_blink: Duration::from_millis(100),
        }
    }
}

/// Everything the controller needs to start its workers.
#[derive(Debug, Clone, Default)]
pub struct EngineCfg {
    pub adc: AdcCfg,
    pub calibration: Calibration,
    pub display: DisplayCfg,
    pub alert: AlertCfg,
    pub recorder: RecorderCfg,
    pub notify: Option<NotifyTarget>,
    pub timing: Timing,
}
