pub mod command;
pub mod error;
pub mod util;

#[cfg(feature = "hardware")]
pub mod gpio;
#[cfg(feature = "hardware")]
pub mod mcp342x;

pub use command::{CommandEject, CommandNotifier};

use currlog_traits::{InputLine, Notifier, OutputLine, StorageEject, Transport};
use error::HwError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Simulated ADC. Produces a slow triangle wave of raw codes so the LED bar
/// and the recorder have something to show without a sensor attached.
pub struct SimulatedAdc {
    step: u32,
    peak_code: u16,
    fixed_code: Option<i16>,
    faulted: Arc<AtomicBool>,
    pending_failures: Arc<AtomicU32>,
}

impl SimulatedAdc {
    pub fn new() -> Self {
        SimulatedAdc {
            step: 0,
            peak_code: 2400,
            fixed_code: None,
            faulted: Arc::new(AtomicBool::new(false)),
            pending_failures: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Always return the same signed code.
    pub fn with_code(code: i16) -> Self {
        SimulatedAdc {
            fixed_code: Some(code),
            ..Self::new()
        }
    }

    /// Permanently fail every bus access (no device on the bus).
    pub fn disconnected() -> Self {
        let adc = Self::new();
        adc.faulted.store(true, Ordering::Relaxed);
        adc
    }

    /// Shared handle: makes the next `n` bus accesses fail.
    pub fn failure_injector(&self) -> Arc<AtomicU32> {
        self.pending_failures.clone()
    }

    fn check_bus(&self) -> Result<(), HwError> {
        if self.faulted.load(Ordering::Relaxed) {
            return Err(HwError::I2c("no acknowledge from device".into()));
        }
        let injected = self
            .pending_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        if injected.is_ok() {
            return Err(HwError::I2c("simulated bus error".into()));
        }
        Ok(())
    }

    fn next_code(&mut self) -> i16 {
        if let Some(code) = self.fixed_code {
            return code;
        }
        let period = u32::from(self.peak_code) * 2;
        let pos = (self.step * 40) % period.max(1);
        self.step = self.step.wrapping_add(1);
        let level = if pos < u32::from(self.peak_code) {
            pos
        } else {
            period - pos
        };
        level as i16
    }
}

impl Default for SimulatedAdc {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SimulatedAdc {
    fn write_config(
        &mut self,
        _address: u8,
        config: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.check_bus()?;
        tracing::trace!(config, "adc config (simulated)");
        Ok(())
    }

    fn read_sample(
        &mut self,
        _address: u8,
        _register: u8,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        self.check_bus()?;
        // The bus delivers the converter's big-endian word byte-swapped.
        let code = self.next_code() as u16;
        Ok(code.swap_bytes())
    }
}

/// Simulated output line; remembers its level and traces changes.
#[derive(Clone)]
pub struct SimulatedLine {
    name: &'static str,
    level: Arc<AtomicBool>,
}

impl SimulatedLine {
    pub fn new(name: &'static str) -> Self {
        SimulatedLine {
            name,
            level: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::Relaxed)
    }
}

impl OutputLine for SimulatedLine {
    fn set(&mut self, high: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let prev = self.level.swap(high, Ordering::Relaxed);
        if prev != high {
            tracing::trace!(line = self.name, high, "output (simulated)");
        }
        Ok(())
    }
}

/// Simulated push button; pressed state is driven through a shared flag.
#[derive(Clone, Default)]
pub struct SimulatedButton {
    pressed: Arc<AtomicBool>,
}

impl SimulatedButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Arc<AtomicBool> {
        self.pressed.clone()
    }
}

impl InputLine for SimulatedButton {
    fn is_active(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.pressed.load(Ordering::Relaxed))
    }
}

/// Storage release that only logs.
pub struct SimulatedEject;

impl StorageEject for SimulatedEject {
    fn release(
        &mut self,
        mount_path: &std::path::Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(path = %mount_path.display(), "storage released (simulated)");
        Ok(())
    }
}

/// Notifier that only logs.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn announce(
        &self,
        device: &str,
        media_url: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(device, media_url, "announcement (simulated)");
        Ok(())
    }
}
