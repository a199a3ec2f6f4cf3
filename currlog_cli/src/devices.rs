//! Device assembly: rppal-backed hardware with the `hardware` feature,
//! simulated devices otherwise.

use std::sync::Arc;

use currlog_config::Config;
use currlog_core::{Devices, LoggerError};
use currlog_traits::{Notifier, OutputLine};

/// Simulated ADC refuses every bus access when set (exercises the fault path).
#[cfg(not(feature = "hardware"))]
const SIM_FAULT_ENV: &str = "CURRLOG_SIM_FAULT";

#[cfg(any(feature = "hardware", test))]
fn hw_init(e: currlog_hardware::error::HwError) -> eyre::Report {
    eyre::Report::new(LoggerError::Transport(e.to_string()))
}

#[cfg(not(feature = "hardware"))]
pub fn build(cfg: &Config) -> eyre::Result<Devices> {
    use currlog_hardware::{LogNotifier, SimulatedAdc, SimulatedButton, SimulatedEject, SimulatedLine};

    let faulted = std::env::var(SIM_FAULT_ENV).is_ok_and(|v| v == "1");
    let adc = if faulted {
        SimulatedAdc::disconnected()
    } else {
        SimulatedAdc::new()
    };
    let notifier: Option<Arc<dyn Notifier + Send + Sync>> = if cfg.notify.enabled {
        Some(Arc::new(LogNotifier))
    } else {
        None
    };
    tracing::info!(faulted, "using simulated devices");
    Ok(Devices {
        transport: Box::new(adc),
        status_led: Box::new(SimulatedLine::new("status")),
        bar_leds: cfg
            .pins
            .bar_leds
            .iter()
            .map(|_| Box::new(SimulatedLine::new("bar")) as Box<dyn OutputLine + Send>)
            .collect(),
        buzzer: cfg
            .pins
            .buzzer
            .map(|_| Box::new(SimulatedLine::new("buzzer")) as Box<dyn OutputLine + Send>),
        button: Box::new(SimulatedButton::new()),
        eject: Box::new(SimulatedEject),
        notifier,
    })
}

#[cfg(feature = "hardware")]
pub fn build(cfg: &Config) -> eyre::Result<Devices> {
    use currlog_hardware::gpio::{open_gpio, open_input, open_output};
    use currlog_hardware::mcp342x::Mcp342x;
    use currlog_hardware::{CommandEject, CommandNotifier};
    use eyre::WrapErr;
    use std::time::Duration;

    let gpio = open_gpio().map_err(hw_init)?;
    let output = |pin: u8| -> eyre::Result<Box<dyn OutputLine + Send>> {
        Ok(Box::new(open_output(&gpio, pin).map_err(hw_init)?))
    };

    let transport = Mcp342x::open(cfg.adc.i2c_bus)
        .map_err(hw_init)
        .wrap_err_with(|| format!("open adc on i2c bus {}", cfg.adc.i2c_bus))?;
    let bar_leds = cfg
        .pins
        .bar_leds
        .iter()
        .map(|&pin| output(pin))
        .collect::<eyre::Result<Vec<_>>>()?;
    let buzzer = cfg.pins.buzzer.map(&output).transpose()?;
    let button = open_input(&gpio, cfg.pins.button, cfg.pins.button_active_low).map_err(hw_init)?;
    let eject = CommandEject::new(&cfg.storage.release_command)
        .map_err(|e| LoggerError::Config(e.to_string()))?;
    let notifier: Option<Arc<dyn Notifier + Send + Sync>> = if cfg.notify.enabled {
        let n = CommandNotifier::new(
            cfg.notify.command.clone(),
            Duration::from_millis(cfg.notify.timeout_ms),
        )
        .map_err(|e| LoggerError::Config(e.to_string()))?;
        Some(Arc::new(n))
    } else {
        None
    };

    Ok(Devices {
        transport: Box::new(transport),
        status_led: output(cfg.pins.status_led)?,
        bar_leds,
        buzzer,
        button: Box::new(button),
        eject: Box::new(eject),
        notifier,
    })
}

#[cfg(all(test, not(feature = "hardware")))]
mod tests {
    use super::*;

    #[test]
    fn simulated_devices_follow_pin_layout() {
        let cfg = currlog_config::load_toml(
            "[pins]\nstatus_led = 21\nbar_leds = [1, 2, 3]\nbutton = 25\n",
        )
        .unwrap();
        let d = build(&cfg).unwrap();
        assert_eq!(d.bar_leds.len(), 3);
        assert!(d.buzzer.is_none());
        assert!(d.notifier.is_none());
    }

    #[test]
    fn hw_init_errors_are_transport_errors() {
        let r = hw_init(currlog_hardware::error::HwError::I2c("nack".into()));
        assert!(matches!(
            r.downcast_ref::<LoggerError>(),
            Some(LoggerError::Transport(_))
        ));
    }
}
