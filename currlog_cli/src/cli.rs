//! CLI argument definitions, shared statics and tracing setup.

use clap::{ArgAction, Parser};
use eyre::WrapErr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "currlog", version, about = "CT clamp current logger")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/currlog.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Handshake with the ADC, take one reading and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub self_check: bool,

    /// Stop after this many milliseconds (same shutdown path as Ctrl-C)
    #[arg(long, value_name = "MS")]
    pub run_ms: Option<u64>,

    /// `debug` to echo the current every few cycles; an integer sets amperes per bar LED
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Overrides carried by the positional arguments.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Positional {
    pub echo: bool,
    pub amp_per_led: Option<f64>,
}

/// Interpret positional arguments: the literal `debug` enables echo, the first non-zero
/// integer becomes the per-LED step, anything else is ignored with a warning.
pub fn parse_positional(args: &[String]) -> Positional {
    let mut out = Positional::default();
    for arg in args {
        if arg == "debug" {
            out.echo = true;
        } else if let Ok(n) = arg.parse::<u32>() {
            if n == 0 {
                tracing::warn!(%arg, "ignoring zero per-LED step");
            } else if out.amp_per_led.is_none() {
                out.amp_per_led = Some(f64::from(n));
            } else {
                tracing::warn!(%arg, "ignoring extra numeric argument");
            }
        } else {
            tracing::warn!(%arg, "ignoring unrecognized argument");
        }
    }
    out
}

fn file_appender(
    path: &Path,
    rotation: Option<&str>,
) -> tracing_appender::rolling::RollingFileAppender {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map_or_else(|| "currlog.log".into(), |n| n.to_os_string());
    match rotation {
        Some("daily") => tracing_appender::rolling::daily(dir, name),
        Some("hourly") => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    }
}

/// Install the global subscriber: console (pretty or JSON) plus an optional
/// JSON file layer. `RUST_LOG` wins over `level`.
pub fn init_tracing(json: bool, level: &str, logging: &currlog_config::Logging) -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level '{level}'"))?;

    let file_layer = logging.file.as_deref().map(|path| {
        let appender = file_appender(Path::new(path), logging.rotation.as_deref());
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer().json().with_ansi(false).with_writer(writer)
    });

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let installed = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    installed.wrap_err("installing tracing subscriber")
}
