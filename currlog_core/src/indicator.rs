//! Status LED shared by the sensor worker (fault blink), the recorder
//! (heartbeat toggle) and the controller (steady on).
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use currlog_traits::{Clock, OutputLine};

/// Fast blink burst: `count` off/on pairs of `half_period` each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern {
    pub count: u8,
    pub half_period: Duration,
}

impl BlinkPattern {
    /// Burst emitted for a transport (ADC) fault.
    pub fn transport(half_period: Duration) -> Self {
        Self {
            count: 3,
            half_period,
        }
    }

    /// Burst emitted when a log file cannot be created.
    pub fn storage(half_period: Duration) -> Self {
        Self {
            count: 5,
            half_period,
        }
    }
}

struct LedState {
    line: Box<dyn OutputLine + Send>,
    on: bool,
}

#[derive(Clone)]
pub struct StatusLed {
    state: Arc<Mutex<LedState>>,
    bursts: Arc<AtomicU64>,
}

impl StatusLed {
    pub fn new(line: Box<dyn OutputLine + Send>) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedState { line, on: false })),
            bursts: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set(&self, on: bool) {
        let mut st = self.state.lock();
        if let Err(e) = st.line.set(on) {
            tracing::warn!(error = %e, "status led write failed");
        }
        st.on = on;
    }

    /// Steady-on: idle, or armed between heartbeats.
    pub fn steady(&self) {
        self.set(true);
    }

    /// Invert the LED; returns the new level.
    pub fn toggle(&self) -> bool {
        let mut st = self.state.lock();
        let next = !st.on;
        if let Err(e) = st.line.set(next) {
            tracing::warn!(error = %e, "status led write failed");
        }
        st.on = next;
        next
    }

    pub fn is_on(&self) -> bool {
        self.state.lock().on
    }

    /// Emit one fail-safe burst and leave the LED steady on.
    /// The lock is released while sleeping so other writers are not stalled.
    pub fn fail_safe(&self, pattern: BlinkPattern, clock: &dyn Clock) {
        self.bursts.fetch_add(1, Ordering::Relaxed);
        for _ in 0..pattern.count {
            self.set(false);
            clock.sleep(pattern.half_period);
            self.set(true);
            clock.sleep(pattern.half_period);
        }
    }

    /// Number of fail-safe bursts emitted so far.
    pub fn fail_safe_bursts(&self) -> u64 {
        self.bursts.load(Ordering::Relaxed)
    }
}
