//! Fire-and-forget overcurrent announcements.
//!
//! Each announcement runs on a detached thread so a slow speaker never delays
//! the control loop. At most one call is in flight; requests made meanwhile
//! are dropped. Failures are logged at debug level and otherwise ignored.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use currlog_traits::Notifier;

use crate::config::NotifyTarget;
use crate::error::LoggerError;

/// Result of a dispatch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Started,
    /// A previous announcement is still running.
    Busy,
    /// The dispatch thread could not be spawned.
    Failed,
}

#[derive(Clone)]
pub struct NotifyDispatcher {
    notifier: Arc<dyn Notifier + Send + Sync>,
    target: NotifyTarget,
    in_flight: Arc<AtomicBool>,
}

impl NotifyDispatcher {
    pub fn new(notifier: Arc<dyn Notifier + Send + Sync>, target: NotifyTarget) -> Self {
        Self {
            notifier,
            target,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn dispatch(&self) -> Dispatch {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("announcement already in flight, skipping");
            return Dispatch::Busy;
        }
        let notifier = self.notifier.clone();
        let target = self.target.clone();
        let in_flight = self.in_flight.clone();
        let spawned = std::thread::Builder::new()
            .name("notify".into())
            .spawn(move || {
                if let Err(e) = notifier.announce(&target.device, &target.media_url) {
                    let err = LoggerError::Notification(e.to_string());
                    tracing::debug!(device = %target.device, error = %err, "announcement failed");
                }
                in_flight.store(false, Ordering::Release);
            });
        match spawned {
            Ok(_detached) => Dispatch::Started,
            Err(e) => {
                self.in_flight.store(false, Ordering::Release);
                tracing::debug!(error = %e, "cannot spawn notify thread");
                Dispatch::Failed
            }
        }
    }
}
