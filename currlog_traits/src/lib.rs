//! Device seams for the current logger.
//!
//! Everything that touches a bus, a pin, the filesystem mount or a remote
//! speaker goes through one of these traits so the engine in `currlog_core`
//! can run against simulated or recording fakes.
pub mod clock;

pub use clock::{Clock, LocalWallClock, MonotonicClock, WallClock};

/// Raw register access to the analog-to-digital converter.
pub trait Transport {
    /// Write one configuration byte (channel select, gain, resolution).
    fn write_config(
        &mut self,
        address: u8,
        config: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Read one 16-bit word as delivered by the bus (bus byte order).
    fn read_sample(
        &mut self,
        address: u8,
        register: u8,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// A single digital output (LED, buzzer).
pub trait OutputLine {
    fn set(&mut self, high: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A single digital input, already normalised to "active" regardless of wiring polarity.
pub trait InputLine {
    fn is_active(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// Releases the removable storage device mounted at `mount_path`.
pub trait StorageEject {
    fn release(
        &mut self,
        mount_path: &std::path::Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Plays a media resource on a remote speaker.
pub trait Notifier {
    fn announce(
        &self,
        device: &str,
        media_url: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: OutputLine + ?Sized> OutputLine for Box<T> {
    fn set(&mut self, high: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set(high)
    }
}

impl<T: InputLine + ?Sized> InputLine for Box<T> {
    fn is_active(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).is_active()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_config(
        &mut self,
        address: u8,
        config: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_config(address, config)
    }

    fn read_sample(
        &mut self,
        address: u8,
        register: u8,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_sample(address, register)
    }
}

impl<T: StorageEject + ?Sized> StorageEject for Box<T> {
    fn release(
        &mut self,
        mount_path: &std::path::Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).release(mount_path)
    }
}
