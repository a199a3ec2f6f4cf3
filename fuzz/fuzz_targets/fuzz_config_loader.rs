#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validation must reject bad input with errors, never panic.
    if let Ok(cfg) = currlog_config::load_toml(data) {
        let _ = cfg.validate();
    }
});
