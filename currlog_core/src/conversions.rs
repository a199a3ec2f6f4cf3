//! `From` implementations bridging `currlog_config` types to `currlog_core` types.

use std::path::PathBuf;
use std::time::Duration;

use crate::calibration::Calibration;
use crate::config::{
    AdcCfg, AlertCfg, Boundary, ChannelPolicy, DisplayCfg, EngineCfg, NotifyTarget, RecorderCfg,
    Timing,
};

// ── AdcCfg ───────────────────────────────────────────────────────────────────

impl From<&currlog_config::Config> for AdcCfg {
    fn from(c: &currlog_config::Config) -> Self {
        Self {
            address: c.adc.address,
            config_byte: c.adc.config_byte,
            channels: usize::from(c.adc.channels),
            settle: Duration::from_millis(c.adc.settle_ms),
            poll: Duration::from_millis(c.sensor.poll_ms),
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&currlog_config::Config> for Calibration {
    fn from(c: &currlog_config::Config) -> Self {
        Self {
            vref: c.adc.vref,
            resolution: c.adc.resolution,
            shunt_ohm: c.sensor.shunt_ohm,
            ct_ratio: c.sensor.ct_ratio,
            rms_factor: c.sensor.rms_factor,
            decimals: c.sensor.decimals,
        }
    }
}

// ── DisplayCfg ───────────────────────────────────────────────────────────────

impl From<currlog_config::Boundary> for Boundary {
    fn from(b: currlog_config::Boundary) -> Self {
        match b {
            currlog_config::Boundary::Strict => Self::Strict,
            currlog_config::Boundary::Inclusive => Self::Inclusive,
        }
    }
}

impl From<currlog_config::ChannelSelect> for ChannelPolicy {
    fn from(c: currlog_config::ChannelSelect) -> Self {
        match c {
            currlog_config::ChannelSelect::First => Self::First,
            currlog_config::ChannelSelect::Max => Self::Max,
            currlog_config::ChannelSelect::Index(i) => Self::Index(i),
        }
    }
}

impl From<&currlog_config::DisplayCfg> for DisplayCfg {
    fn from(c: &currlog_config::DisplayCfg) -> Self {
        Self {
            amp_per_led: c.amp_per_led,
            boundary: c.boundary.into(),
            channel: c.channel.into(),
            echo: false,
            echo_every: c.echo_every,
        }
    }
}

// ── AlertCfg ─────────────────────────────────────────────────────────────────

impl From<&currlog_config::AlertCfg> for AlertCfg {
    fn from(c: &currlog_config::AlertCfg) -> Self {
        Self {
            overcurrent_a: c.overcurrent_a,
            pulse: Duration::from_millis(c.pulse_ms),
            pulses: c.pulses,
            cooldown: Duration::from_millis(c.cooldown_ms),
            startup_pulse: Duration::from_millis(c.startup_pulse_ms),
        }
    }
}

// ── RecorderCfg ──────────────────────────────────────────────────────────────

impl From<&currlog_config::Config> for RecorderCfg {
    fn from(c: &currlog_config::Config) -> Self {
        Self {
            mount_path: PathBuf::from(&c.storage.mount_path),
            extension: c.storage.extension.clone(),
            channels: usize::from(c.adc.channels),
            decimals: c.sensor.decimals,
        }
    }
}

// ── NotifyTarget ─────────────────────────────────────────────────────────────

impl NotifyTarget {
    /// `None` unless notifications are enabled and fully specified.
    pub fn from_config(c: &currlog_config::NotifyCfg) -> Option<Self> {
        if !c.enabled {
            return None;
        }
        Some(Self {
            device: c.device.clone()?,
            media_url: c.media_url.clone()?,
        })
    }
}

// ── Timing ───────────────────────────────────────────────────────────────────

impl From<&currlog_config::TimingCfg> for Timing {
    fn from(c: &currlog_config::TimingCfg) -> Self {
        Self {
            loop_period: Duration::from_millis(c.loop_ms),
            recorder_tick: Duration::from_millis(c.recorder_tick_ms),
            button_poll: Duration::from_millis(c.button_poll_ms),
            debounce_settle: Duration::from_millis(c.debounce_settle_ms),
            startup: Duration::from_millis(c.startup_ms),
            fail_blink: Duration::from_millis(c.fail_blink_ms),
        }
    }
}

// ── EngineCfg ────────────────────────────────────────────────────────────────

impl From<&currlog_config::Config> for EngineCfg {
    fn from(c: &currlog_config::Config) -> Self {
        Self {
            adc: c.into(),
            calibration: c.into(),
            display: (&c.display).into(),
            alert: (&c.alert).into(),
            recorder: c.into(),
            notify: NotifyTarget::from_config(&c.notify),
            timing: (&c.timing).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_cfg_mirrors_file_config() {
        let toml = r#"
[pins]
status_led = 21
bar_leds = [20, 5, 6]
button = 25

[adc]
channels = 4
settle_ms = 5

[display]
amp_per_led = 2.5
boundary = "inclusive"
channel = "max"

[alert]
overcurrent_a = 12.0

[notify]
enabled = true
device = "kitchen"
media_url = "http://h/a.mp3"
command = ["notify"]
"#;
        let cfg = currlog_config::load_toml(toml).unwrap();
        let engine = EngineCfg::from(&cfg);
        assert_eq!(engine.adc.channels, 4);
        assert_eq!(engine.adc.settle, Duration::from_millis(5));
        assert_eq!(engine.recorder.channels, 4);
        assert_eq!(engine.display.boundary, Boundary::Inclusive);
        assert_eq!(engine.display.channel, ChannelPolicy::Max);
        assert_eq!(engine.alert.overcurrent_a, Some(12.0));
        assert_eq!(
            engine.notify,
            Some(NotifyTarget {
                device: "kitchen".into(),
                media_url: "http://h/a.mp3".into()
            })
        );
        assert!(!engine.display.echo);
    }
}
