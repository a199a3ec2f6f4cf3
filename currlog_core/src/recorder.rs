//! CSV recording sessions on removable storage.
//!
//! The recorder owns the only open log file. It is driven by commands from
//! the controller (arm, disarm) and by its own tick, which appends at most
//! one row per wall-clock second and rotates the file when the local hour
//! changes. Write failures are logged and the session stays open.
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use crossbeam_channel as xch;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use currlog_traits::{Clock, StorageEject, WallClock};

use crate::config::RecorderCfg;
use crate::error::{LoggerError, Result};
use crate::indicator::{BlinkPattern, StatusLed};
use crate::snapshot::SharedReadings;
use crate::worker::Worker;

pub type LogSink = Box<dyn Write + Send>;

/// Creates the sink for a new log file. The default truncates or creates a regular file.
pub type SinkOpener = Box<dyn FnMut(&Path) -> io::Result<LogSink> + Send>;

fn open_file(path: &Path) -> io::Result<LogSink> {
    let f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(Box::new(f))
}

/// Header row for `channels` measured channels.
pub fn header(channels: usize) -> Vec<String> {
    let mut h = vec!["day[yyyy/mm/dd]".to_string(), "time[hh:mm:ss]".to_string()];
    if channels <= 1 {
        h.push("current[A]".into());
    } else {
        h.extend((1..=channels).map(|i| format!("ch{i}[A]")));
    }
    h
}

/// File name for a session started at `start`.
pub fn file_name(start: NaiveDateTime, extension: &str) -> String {
    format!("{}.{extension}", start.format("%Y%m%d_%H%M%S"))
}

fn hour_key(t: NaiveDateTime) -> (NaiveDate, u32) {
    (t.date(), t.hour())
}

/// Encode one CSV record into its own buffer so a failed write never leaves
/// a partial row queued for the next one.
fn encode_record<I, F>(fields: I) -> std::result::Result<Vec<u8>, csv::Error>
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    w.write_record(fields)?;
    w.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

fn whole_second(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}

struct Session {
    sink: LogSink,
    path: PathBuf,
    started: NaiveDateTime,
    last_written: Option<NaiveDateTime>,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Disarmed,
    /// Already wrote a row for this second.
    SameSecond,
    Written,
    WriteFailed,
    /// Hour changed: the old file was closed and a new one opened (or failed to open).
    Rotated,
}

pub struct Recorder<E: StorageEject> {
    cfg: RecorderCfg,
    readings: SharedReadings,
    status: StatusLed,
    blink: BlinkPattern,
    eject: E,
    wall: Arc<dyn WallClock + Send + Sync>,
    clock: Arc<dyn Clock + Send + Sync>,
    opener: SinkOpener,
    session: Option<Session>,
    armed: Arc<AtomicBool>,
}

impl<E: StorageEject> Recorder<E> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cfg: RecorderCfg,
        readings: SharedReadings,
        status: StatusLed,
        blink: BlinkPattern,
        eject: E,
        wall: Arc<dyn WallClock + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            cfg,
            readings,
            status,
            blink,
            eject,
            wall,
            clock,
            opener: Box::new(open_file),
            session: None,
            armed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace how log files are created.
    pub fn with_opener(mut self, opener: SinkOpener) -> Self {
        self.opener = opener;
        self
    }

    pub fn is_armed(&self) -> bool {
        self.session.is_some()
    }

    /// Shared view of the armed flag; only this recorder writes it.
    pub fn armed_flag(&self) -> Arc<AtomicBool> {
        self.armed.clone()
    }

    /// Path of the open log file, if any.
    pub fn current_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    fn open_session(&mut self, started: NaiveDateTime) -> std::result::Result<Session, LoggerError> {
        let path = self
            .cfg
            .mount_path
            .join(file_name(started, &self.cfg.extension));
        let mut sink = (self.opener)(&path)
            .map_err(|e| LoggerError::Storage(format!("create {}: {e}", path.display())))?;
        encode_record(header(self.cfg.channels))
            .and_then(|bytes| {
                sink.write_all(&bytes)?;
                sink.flush()?;
                Ok(())
            })
            .map_err(|e| LoggerError::Storage(format!("header {}: {e}", path.display())))?;
        Ok(Session {
            sink,
            path,
            started,
            last_written: None,
        })
    }

    /// Open a new session named after the current time. No-op when armed.
    pub fn arm(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        let started = self.wall.now();
        match self.open_session(started) {
            Ok(session) => {
                tracing::info!(path = %session.path.display(), "recording started");
                self.session = Some(session);
                self.armed.store(true, Ordering::Release);
                self.status.steady();
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot open log file");
                self.status.fail_safe(self.blink, &*self.clock);
                Err(e.into())
            }
        }
    }

    /// Close the session (if any) and optionally release the storage device.
    /// Release is attempted even when nothing was open.
    pub fn disarm(&mut self, release_storage: bool) {
        if let Some(mut session) = self.session.take() {
            let path = session.path;
            if let Err(e) = session.sink.flush() {
                tracing::warn!(path = %path.display(), error = %e, "closing log file failed");
            }
            self.armed.store(false, Ordering::Release);
            self.status.steady();
            tracing::info!(path = %path.display(), "recording stopped");
        }
        if release_storage {
            match self.eject.release(&self.cfg.mount_path) {
                Ok(()) => tracing::info!(path = %self.cfg.mount_path.display(), "storage released"),
                Err(e) => {
                    tracing::warn!(path = %self.cfg.mount_path.display(), error = %e, "storage release failed");
                }
            }
        }
    }

    fn format_row(&self, at: NaiveDateTime, amps: &[f64]) -> Vec<String> {
        let prec = usize::from(self.cfg.decimals);
        let mut row = Vec::with_capacity(2 + amps.len());
        row.push(at.format("%Y/%m/%d").to_string());
        row.push(at.format("%H:%M:%S").to_string());
        row.extend(amps.iter().map(|a| format!("{a:.prec$}")));
        row
    }

    /// One recorder cycle.
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.wall.now();
        let (started, last) = match &self.session {
            None => return TickOutcome::Disarmed,
            Some(s) => (s.started, s.last_written),
        };

        if hour_key(now) != hour_key(started) {
            tracing::info!("hour changed, rotating log file");
            self.disarm(false);
            let _ = self.arm();
            return TickOutcome::Rotated;
        }

        let second = whole_second(now);
        if last == Some(second) {
            return TickOutcome::SameSecond;
        }
        let snapshot = self.readings.latest();
        let row = self.format_row(second, &snapshot.amps);
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Disarmed;
        };
        session.last_written = Some(second);
        let written = encode_record(&row).and_then(|bytes| {
            session.sink.write_all(&bytes)?;
            session.sink.flush()?;
            Ok(())
        });
        match written {
            Ok(()) => {
                self.status.toggle();
                TickOutcome::Written
            }
            Err(e) => {
                tracing::error!(path = %session.path.display(), error = %e, "log write failed, row dropped");
                TickOutcome::WriteFailed
            }
        }
    }
}

/// Commands accepted by the recorder thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderCommand {
    Arm,
    Disarm { release_storage: bool },
    Stop,
}

impl<E: StorageEject + Send + 'static> Recorder<E> {
    /// Run the recorder on its own thread, ticking every `tick`.
    /// On stop the open session is closed without releasing storage.
    pub fn spawn(mut self, tick: Duration) -> Result<RecorderHandle> {
        let (tx, rx) = xch::unbounded::<RecorderCommand>();
        let armed = self.armed_flag();
        let worker = Worker::spawn("recorder", move |stop| {
            while !stop.load(Ordering::Relaxed) {
                match rx.recv_timeout(tick) {
                    Ok(RecorderCommand::Arm) => {
                        let _ = self.arm();
                    }
                    Ok(RecorderCommand::Disarm { release_storage }) => self.disarm(release_storage),
                    Ok(RecorderCommand::Stop) | Err(xch::RecvTimeoutError::Disconnected) => break,
                    Err(xch::RecvTimeoutError::Timeout) => {}
                }
                self.tick();
            }
            self.disarm(false);
        })?;
        Ok(RecorderHandle { tx, armed, worker })
    }
}

pub struct RecorderHandle {
    tx: xch::Sender<RecorderCommand>,
    armed: Arc<AtomicBool>,
    worker: Worker,
}

impl RecorderHandle {
    pub fn arm(&self) {
        self.send(RecorderCommand::Arm);
    }

    pub fn disarm(&self, release_storage: bool) {
        self.send(RecorderCommand::Disarm { release_storage });
    }

    fn send(&self, cmd: RecorderCommand) {
        if self.tx.send(cmd).is_err() {
            tracing::warn!(?cmd, "recorder thread is gone");
        }
    }

    /// Last armed state published by the recorder; may lag one tick.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Close any session and wait for the thread to exit.
    pub fn stop(&mut self) {
        let _ = self.tx.send(RecorderCommand::Stop);
        self.worker.join();
    }
}
