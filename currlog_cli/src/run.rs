//! Config loading, engine assembly and the run / self-check paths.

use eyre::WrapErr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use currlog_config::Config;
use currlog_core::{
    BlinkPattern, Clocks, Controller, EngineCfg, LoggerError, PollOutcome, SensorPoller,
    SharedReadings, StatusLed,
};

use crate::cli::{Cli, init_tracing, parse_positional};
use crate::devices;

/// Read and parse the TOML file; every failure is a configuration error.
pub fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| LoggerError::Config(format!("cannot read {}: {e}", path.display())))?;
    let cfg = currlog_config::load_toml(&text)
        .map_err(|e| LoggerError::Config(format!("{}: {e}", path.display())))?;
    Ok(cfg)
}

pub fn run(cli: &Cli) -> eyre::Result<()> {
    let mut cfg = load_config(&cli.config)?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| cfg.logging.level.clone())
        .unwrap_or_else(|| "info".into());
    init_tracing(cli.json, &level, &cfg.logging)?;

    let pos = parse_positional(&cli.args);
    if let Some(step) = pos.amp_per_led {
        tracing::info!(amp_per_led = step, "bar step overridden from command line");
        cfg.display.amp_per_led = step;
    }
    cfg.validate()
        .map_err(|e| LoggerError::Config(e.to_string()))?;

    let mut engine = EngineCfg::from(&cfg);
    engine.display.echo = pos.echo;
    let devices = devices::build(&cfg)?;

    if cli.self_check {
        return self_check(devices, &engine);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
            .wrap_err("installing Ctrl-C handler")?;
    }
    if let Some(ms) = cli.run_ms {
        let flag = shutdown.clone();
        std::thread::Builder::new()
            .name("run-timer".into())
            .spawn(move || {
                std::thread::sleep(Duration::from_millis(ms));
                flag.store(true, Ordering::Relaxed);
            })
            .wrap_err("spawning run timer")?;
    }

    tracing::info!(config = %cli.config.display(), "starting current logger");
    let mut controller = Controller::start(devices, engine, Clocks::default())?;
    controller.run(&shutdown);
    Ok(())
}

/// One handshake and one reading set, printed to stdout.
fn self_check(devices: currlog_core::Devices, engine: &EngineCfg) -> eyre::Result<()> {
    let readings = SharedReadings::new(engine.adc.channels);
    let mut poller = SensorPoller::new(
        devices.transport,
        engine.adc.clone(),
        engine.calibration,
        readings.clone(),
        StatusLed::new(devices.status_led),
        BlinkPattern::transport(engine.timing.fail_blink),
        Clocks::default().mono,
    );
    match poller.poll_once() {
        PollOutcome::Published(_) => {
            let prec = usize::from(engine.calibration.decimals);
            let values: Vec<String> = readings
                .latest()
                .amps
                .iter()
                .map(|a| format!("{a:.prec$} A"))
                .collect();
            println!("self-check OK: {}", values.join(", "));
            Ok(())
        }
        PollOutcome::HandshakeFailed(e) | PollOutcome::ReadFailed { error: e, .. } => {
            Err(eyre::Report::new(e).wrap_err("self-check failed"))
        }
    }
}
