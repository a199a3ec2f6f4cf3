//! Human-readable error descriptions, exit codes and structured JSON errors.

use currlog_core::LoggerError;

/// Stable exit codes.
pub const EXIT_OTHER: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_HARDWARE: i32 = 3;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(le) = err.downcast_ref::<LoggerError>() {
        return match le {
            LoggerError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file (see etc/currlog.toml for a sample), then rerun."
            ),
            LoggerError::Transport(msg) => format!(
                "What happened: The current sensor ADC did not respond ({msg}).\nLikely causes: I2C disabled, wrong bus or address, loose wiring or no power to the converter.\nHow to fix: Check [adc] i2c_bus and address, run i2cdetect, verify wiring, then rerun with --self-check."
            ),
            LoggerError::TransportTimeout => {
                "What happened: The current sensor ADC timed out.\nLikely causes: Bus clock stretching, a flaky connection or a converter stuck in a conversion.\nHow to fix: Reseat the sensor cable and power cycle the board, then rerun with --self-check.".to_string()
            }
            LoggerError::Storage(msg) => format!(
                "What happened: The log file could not be written ({msg}).\nLikely causes: USB stick not mounted at storage.mount_path, read-only, or full.\nHow to fix: Mount the stick at the configured path and check free space."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// 2 for configuration problems, 3 for hardware/ADC failures, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<LoggerError>() {
        Some(LoggerError::Config(_)) => EXIT_CONFIG,
        Some(LoggerError::Transport(_) | LoggerError::TransportTimeout) => EXIT_HARDWARE,
        _ => EXIT_OTHER,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<LoggerError>() {
        Some(LoggerError::Config(_)) => "Config",
        Some(LoggerError::Transport(_)) => "Transport",
        Some(LoggerError::TransportTimeout) => "TransportTimeout",
        Some(LoggerError::Storage(_)) => "Storage",
        Some(LoggerError::Notification(_)) => "Notification",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
