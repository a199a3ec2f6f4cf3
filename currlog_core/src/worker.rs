//! Background thread ownership shared by all workers.
//!
//! Each `Worker` owns exactly one named thread and a cooperative stop flag.
//! Dropping the handle signals the flag and joins, so a worker can never
//! outlive its owner.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use eyre::WrapErr;

use crate::error::Result;

pub struct Worker {
    name: &'static str,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn `body` on a thread named `name`. The body receives the stop flag
    /// and must check it at the top of its loop.
    pub fn spawn<F>(name: &'static str, body: F) -> Result<Self>
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        let join_handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                body(flag);
                tracing::trace!(worker = name, "thread exiting cleanly");
            })
            .wrap_err_with(|| format!("spawning {name} worker"))?;
        Ok(Self {
            name,
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    /// Ask the thread to stop; does not wait.
    pub fn signal_stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signal and wait for the thread to return. Safe to call more than once.
    pub fn join(&mut self) {
        self.signal_stop();
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::debug!(worker = self.name, "worker joined"),
                Err(e) => tracing::warn!(worker = self.name, ?e, "worker panicked during shutdown"),
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn join_stops_loop_and_is_idempotent() {
        let ticks = Arc::new(AtomicU32::new(0));
        let t = ticks.clone();
        let mut w = Worker::spawn("ticker", move |stop| {
            while !stop.load(Ordering::Relaxed) {
                t.fetch_add(1, Ordering::Relaxed);
                std::thread::sleep(Duration::from_millis(1));
            }
        })
        .unwrap();
        std::thread::sleep(Duration::from_millis(10));
        w.join();
        assert!(w.is_finished());
        let seen = ticks.load(Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(ticks.load(Ordering::Relaxed), seen);
        w.join();
    }

    #[test]
    fn drop_joins_thread() {
        let done = Arc::new(AtomicBool::new(false));
        let d = done.clone();
        {
            let _w = Worker::spawn("dropper", move |stop| {
                while !stop.load(Ordering::Relaxed) {
                    std::thread::sleep(Duration::from_millis(1));
                }
                d.store(true, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn panicking_body_does_not_poison_join() {
        let mut w = Worker::spawn("boom", |_| panic!("worker failure")).unwrap();
        w.join();
        assert!(w.is_finished());
    }
}
