use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Call `poll` every `interval` until it yields a value or `timeout` elapses.
pub fn poll_until<T>(
    mut poll: impl FnMut() -> Option<T>,
    timeout: Duration,
    interval: Duration,
) -> Result<T> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(v) = poll() {
            return Ok(v);
        }
        if Instant::now() >= deadline {
            return Err(HwError::Timeout);
        }
        std::thread::sleep(interval);
    }
}
