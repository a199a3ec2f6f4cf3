#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the current logger.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section except `[pins]` has defaults matching the reference board
//!   (MCP3425 at 0x68, 10 Ω shunt, 3000:1 clamp, six-LED bar).
use serde::Deserialize;
use serde::de::Deserializer;

#[derive(Debug, Deserialize)]
pub struct Pins {
    pub status_led: u8,
    pub bar_leds: Vec<u8>,
    pub button: u8,
    /// Buzzer output; when absent alerts are silent.
    #[serde(default)]
    pub buzzer: Option<u8>,
    /// Treat low level on the button pin as pressed
    #[serde(default = "default_true")]
    pub button_active_low: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AdcCfg {
    pub i2c_bus: u8,
    pub address: u8,
    /// Base configuration byte; channel bits (5..6) are filled in per channel.
    pub config_byte: u8,
    /// Number of converter channels to poll (1..=4)
    pub channels: u8,
    /// Reference voltage in volts
    pub vref: f64,
    /// Full-scale code count for the selected resolution (32768 for 16-bit)
    pub resolution: f64,
    /// Wait between channel select and read; a converter in continuous mode
    /// needs a full conversion time here after each channel switch
    pub settle_ms: u64,
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            address: 0x68,
            config_byte: 0b1001_1000,
            channels: 1,
            vref: 2.048,
            resolution: 32768.0,
            settle_ms: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    pub shunt_ohm: f64,
    /// Real current / sensor output current
    pub ct_ratio: f64,
    /// Rectified-average to RMS correction (1 A RMS sine reads 0.9005 A averaged)
    pub rms_factor: f64,
    /// Decimal places kept in readings and log rows
    pub decimals: u8,
    pub poll_ms: u64,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            shunt_ohm: 10.0,
            ct_ratio: 3000.0,
            rms_factor: 0.9005,
            decimals: 6,
            poll_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// LED n lights when current > n * step
    #[default]
    Strict,
    /// LED n lights when current >= n * step
    Inclusive,
}

/// Which channel drives the bar and the overcurrent alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelSelect {
    #[default]
    First,
    Max,
    Index(usize),
}

impl<'de> Deserialize<'de> for ChannelSelect {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Index(usize),
            Name(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Index(i) => Ok(Self::Index(i)),
            Raw::Name(s) => match s.as_str() {
                "first" => Ok(Self::First),
                "max" => Ok(Self::Max),
                other => Err(serde::de::Error::custom(format!(
                    "unknown channel policy '{other}' (expected \"first\", \"max\" or an index)"
                ))),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayCfg {
    /// Current represented by one bar LED
    pub amp_per_led: f64,
    pub boundary: Boundary,
    pub channel: ChannelSelect,
    /// Verbose echo prints every Nth controller cycle
    pub echo_every: u32,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            amp_per_led: 5.0,
            boundary: Boundary::Strict,
            channel: ChannelSelect::First,
            echo_every: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AlertCfg {
    /// Overcurrent threshold in amperes; absent disables alerting
    pub overcurrent_a: Option<f64>,
    pub pulse_ms: u64,
    pub pulses: u8,
    pub cooldown_ms: u64,
    pub startup_pulse_ms: u64,
}

impl Default for AlertCfg {
    fn default() -> Self {
        Self {
            overcurrent_a: None,
            pulse_ms: 100,
            pulses: 3,
            cooldown_ms: 1000,
            startup_pulse_ms: 200,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
    pub mount_path: String,
    pub extension: String,
    /// Program + args; the mount path is appended
    pub release_command: Vec<String>,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            mount_path: "/media/pi/MYUSB".into(),
            extension: "csv".into(),
            release_command: vec!["umount".into()],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotifyCfg {
    pub enabled: bool,
    pub device: Option<String>,
    pub media_url: Option<String>,
    /// Program + args; `{device}` and `{url}` are substituted
    pub command: Vec<String>,
    pub timeout_ms: u64,
}

impl Default for NotifyCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            device: None,
            media_url: None,
            command: Vec::new(),
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingCfg {
    /// Controller loop period
    pub loop_ms: u64,
    pub recorder_tick_ms: u64,
    /// Poll interval while waiting for button release
    pub button_poll_ms: u64,
    /// Settle after release before toggling recording
    pub debounce_settle_ms: u64,
    /// Attention sequence length at startup
    pub startup_ms: u64,
    /// Half period of the fail-safe blink
    pub fail_blink_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            loop_ms: 100,
            recorder_tick_ms: 50,
            button_poll_ms: 50,
            debounce_settle_ms: 200,
            startup_ms: 1000,
            fail_blink_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub adc: AdcCfg,
    #[serde(default)]
    pub sensor: SensorCfg,
    #[serde(default)]
    pub display: DisplayCfg,
    #[serde(default)]
    pub alert: AlertCfg,
    #[serde(default)]
    pub storage: StorageCfg,
    #[serde(default)]
    pub notify: NotifyCfg,
    #[serde(default)]
    pub timing: TimingCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Largest bar the controller drives.
pub const MAX_BAR_LEDS: usize = 16;

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        if self.pins.bar_leds.is_empty() {
            eyre::bail!("pins.bar_leds must list at least one pin");
        }
        if self.pins.bar_leds.len() > MAX_BAR_LEDS {
            eyre::bail!("pins.bar_leds supports at most {MAX_BAR_LEDS} LEDs");
        }

        // ADC
        if !(1..=4).contains(&self.adc.channels) {
            eyre::bail!("adc.channels must be in 1..=4");
        }
        if self.adc.address > 0x7f {
            eyre::bail!("adc.address must be a 7-bit I2C address");
        }
        if !(self.adc.vref.is_finite() && self.adc.vref > 0.0) {
            eyre::bail!("adc.vref must be > 0");
        }
        if !(self.adc.resolution.is_finite() && self.adc.resolution > 0.0) {
            eyre::bail!("adc.resolution must be > 0");
        }
        if self.adc.channels > 1 && self.adc.settle_ms == 0 {
            eyre::bail!("adc.settle_ms must be >= 1 when polling more than one channel");
        }
        if self.adc.settle_ms > 1000 {
            eyre::bail!("adc.settle_ms is unreasonably large (>1s)");
        }

        // Sensor
        if !(self.sensor.shunt_ohm.is_finite() && self.sensor.shunt_ohm > 0.0) {
            eyre::bail!("sensor.shunt_ohm must be > 0");
        }
        if !(self.sensor.ct_ratio.is_finite() && self.sensor.ct_ratio > 0.0) {
            eyre::bail!("sensor.ct_ratio must be > 0");
        }
        if !(self.sensor.rms_factor.is_finite() && self.sensor.rms_factor > 0.0) {
            eyre::bail!("sensor.rms_factor must be > 0");
        }
        if self.sensor.decimals > 9 {
            eyre::bail!("sensor.decimals must be <= 9");
        }
        if self.sensor.poll_ms == 0 {
            eyre::bail!("sensor.poll_ms must be >= 1");
        }

        // Display
        if !(self.display.amp_per_led.is_finite() && self.display.amp_per_led > 0.0) {
            eyre::bail!("display.amp_per_led must be > 0");
        }
        if let ChannelSelect::Index(i) = self.display.channel
            && i >= usize::from(self.adc.channels)
        {
            eyre::bail!(
                "display.channel index {i} out of range for {} channel(s)",
                self.adc.channels
            );
        }
        if self.display.echo_every == 0 {
            eyre::bail!("display.echo_every must be >= 1");
        }

        // Alert
        if let Some(a) = self.alert.overcurrent_a
            && !(a.is_finite() && a > 0.0)
        {
            eyre::bail!("alert.overcurrent_a must be > 0");
        }
        if self.alert.pulse_ms == 0 {
            eyre::bail!("alert.pulse_ms must be >= 1");
        }

        // Storage
        if self.storage.mount_path.trim().is_empty() {
            eyre::bail!("storage.mount_path must not be empty");
        }
        if self.storage.extension.is_empty() || self.storage.extension.contains('/') {
            eyre::bail!("storage.extension must be a plain file extension");
        }
        if self.storage.release_command.is_empty() {
            eyre::bail!("storage.release_command must name a program");
        }

        // Notify
        if self.notify.enabled {
            if self.notify.device.as_deref().is_none_or(str::is_empty) {
                eyre::bail!("notify.device is missing (required when notify.enabled)");
            }
            if self.notify.media_url.as_deref().is_none_or(str::is_empty) {
                eyre::bail!("notify.media_url is missing (required when notify.enabled)");
            }
            if self.notify.command.is_empty() {
                eyre::bail!("notify.command is missing (required when notify.enabled)");
            }
            if self.notify.timeout_ms == 0 {
                eyre::bail!("notify.timeout_ms must be >= 1");
            }
        }

        // Timing
        if self.timing.loop_ms == 0 {
            eyre::bail!("timing.loop_ms must be >= 1");
        }
        if self.timing.recorder_tick_ms == 0 || self.timing.recorder_tick_ms > 500 {
            eyre::bail!("timing.recorder_tick_ms must be in 1..=500 (sub-second)");
        }
        if self.timing.button_poll_ms == 0 {
            eyre::bail!("timing.button_poll_ms must be >= 1");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got '{r}'");
        }

        Ok(())
    }
}
