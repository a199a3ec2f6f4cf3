//! Test and helper mocks for currlog_core: deterministic clocks and
//! recording fakes for every device seam.
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use currlog_traits::{
    Clock, InputLine, Notifier, OutputLine, StorageEject, Transport, WallClock,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Deterministic monotonic clock; `sleep(d)` advances time by `d` without sleeping.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, d: Duration) {
        let mut off = self.offset.lock();
        *off = off.saturating_add(d);
    }

    /// Total simulated time slept or advanced.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

/// Wall clock set by the test.
#[derive(Debug, Clone)]
pub struct ManualWallClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualWallClock {
    pub fn at(t: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(t)),
        }
    }

    /// Parse `YYYY-MM-DD HH:MM:SS[.fff]`; panics on malformed input (tests only).
    pub fn parse(s: &str) -> Self {
        let t = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
            .unwrap_or_else(|e| panic!("bad timestamp {s:?}: {e}"));
        Self::at(t)
    }

    pub fn set(&self, t: NaiveDateTime) {
        *self.now.lock() = t;
    }

    pub fn advance(&self, d: Duration) {
        let step = chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero());
        let mut now = self.now.lock();
        *now += step;
    }
}

impl WallClock for ManualWallClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

/// Output line that records every level written to it.
#[derive(Debug, Clone, Default)]
pub struct RecordingLine {
    levels: Arc<Mutex<Vec<bool>>>,
}

impl RecordingLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(&self) -> Vec<bool> {
        self.levels.lock().clone()
    }

    pub fn is_high(&self) -> bool {
        self.levels.lock().last().copied().unwrap_or(false)
    }

    /// Number of low→high transitions (pulses started).
    pub fn rising_edges(&self) -> usize {
        let levels = self.levels.lock();
        let mut prev = false;
        let mut n = 0;
        for &l in levels.iter() {
            if l && !prev {
                n += 1;
            }
            prev = l;
        }
        n
    }
}

impl OutputLine for RecordingLine {
    fn set(&mut self, high: bool) -> Result<(), BoxError> {
        self.levels.lock().push(high);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    codes: Vec<i16>,
    fail_writes: u32,
    fail_reads: u32,
    writes: Vec<(u8, u8)>,
    reads: usize,
}

/// Transport returning fixed signed codes per channel, with injectable failures.
/// The channel is decoded from bits 5..6 of the register selector.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn with_codes(codes: Vec<i16>) -> Self {
        let t = Self::default();
        t.state.lock().codes = codes;
        t
    }

    pub fn set_codes(&self, codes: Vec<i16>) {
        self.state.lock().codes = codes;
    }

    /// The next `n` `write_config` calls fail.
    pub fn fail_next_writes(&self, n: u32) {
        self.state.lock().fail_writes = n;
    }

    /// The next `n` `read_sample` calls fail.
    pub fn fail_next_reads(&self, n: u32) {
        self.state.lock().fail_reads = n;
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.state.lock().writes.clone()
    }

    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }
}

impl Transport for ScriptedTransport {
    fn write_config(&mut self, address: u8, config: u8) -> Result<(), BoxError> {
        let mut st = self.state.lock();
        if st.fail_writes > 0 {
            st.fail_writes -= 1;
            return Err("scripted write failure".into());
        }
        st.writes.push((address, config));
        Ok(())
    }

    fn read_sample(&mut self, _address: u8, register: u8) -> Result<u16, BoxError> {
        let mut st = self.state.lock();
        if st.fail_reads > 0 {
            st.fail_reads -= 1;
            return Err("scripted read failure".into());
        }
        st.reads += 1;
        let channel = usize::from((register >> 5) & 0b11);
        let code = st.codes.get(channel).copied().unwrap_or(0);
        Ok((code as u16).swap_bytes())
    }
}

/// A transport that always errors; useful for fault-path tests.
pub struct NoopTransport;

impl Transport for NoopTransport {
    fn write_config(&mut self, _address: u8, _config: u8) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::other("noop transport")))
    }

    fn read_sample(&mut self, _address: u8, _register: u8) -> Result<u16, BoxError> {
        Err(Box::new(std::io::Error::other("noop transport")))
    }
}

/// Storage release that records each call.
#[derive(Debug, Clone, Default)]
pub struct RecordingEject {
    released: Arc<Mutex<Vec<PathBuf>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingEject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let e = Self::default();
        e.fail.store(true, Ordering::Relaxed);
        e
    }

    pub fn releases(&self) -> usize {
        self.released.lock().len()
    }

    pub fn released_paths(&self) -> Vec<PathBuf> {
        self.released.lock().clone()
    }
}

impl StorageEject for RecordingEject {
    fn release(&mut self, mount_path: &Path) -> Result<(), BoxError> {
        self.released.lock().push(mount_path.to_path_buf());
        if self.fail.load(Ordering::Relaxed) {
            return Err("umount: target is busy".into());
        }
        Ok(())
    }
}

/// Notifier that counts calls; can be made slow or failing.
#[derive(Debug, Clone, Default)]
pub struct CountingNotifier {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    fail: bool,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Notifier for CountingNotifier {
    fn announce(&self, _device: &str, _media_url: &str) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail {
            return Err("speaker unreachable".into());
        }
        Ok(())
    }
}

/// Button that reports active for a scripted number of polls.
#[derive(Debug, Clone, Default)]
pub struct ScriptedButton {
    remaining_active: Arc<AtomicU32>,
    polls: Arc<AtomicUsize>,
}

impl ScriptedButton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report active for the next `polls` reads, then released.
    pub fn press_for(&self, polls: u32) {
        self.remaining_active.store(polls, Ordering::SeqCst);
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl InputLine for ScriptedButton {
    fn is_active(&mut self) -> Result<bool, BoxError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let prev = self
            .remaining_active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        Ok(prev.is_ok())
    }
}
