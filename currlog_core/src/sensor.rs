//! Sensor worker: polls every configured channel, converts to amperes and
//! publishes complete reading sets.
//!
//! The worker owns the transport and its state machine. While not `Ready`
//! it retries the handshake once per cycle; any transport failure drops it
//! to `Faulted` and emits exactly one fail-safe burst on the status LED.
use std::sync::Arc;
use std::sync::atomic::Ordering;

use currlog_traits::{Clock, Transport};

use crate::calibration::Calibration;
use crate::config::AdcCfg;
use crate::error::{LoggerError, Result};
use crate::hw_error::map_transport_error;
use crate::indicator::{BlinkPattern, StatusLed};
use crate::snapshot::SharedReadings;
use crate::worker::Worker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Uninitialized,
    Ready,
    Faulted,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// A full set was published under this sequence number.
    Published(u64),
    HandshakeFailed(LoggerError),
    /// Reading `channel` failed; the previous set stays published.
    ReadFailed { channel: usize, error: LoggerError },
}

pub struct SensorPoller<T: Transport> {
    transport: T,
    adc: AdcCfg,
    calibration: Calibration,
    readings: SharedReadings,
    status: StatusLed,
    blink: BlinkPattern,
    clock: Arc<dyn Clock + Send + Sync>,
    state: TransportState,
}

impl<T: Transport> SensorPoller<T> {
    pub fn new(
        transport: T,
        adc: AdcCfg,
        calibration: Calibration,
        readings: SharedReadings,
        status: StatusLed,
        blink: BlinkPattern,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            transport,
            adc,
            calibration,
            readings,
            status,
            blink,
            clock,
            state: TransportState::Uninitialized,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    fn fault(&mut self) {
        self.state = TransportState::Faulted;
        self.status.fail_safe(self.blink, &*self.clock);
    }

    fn handshake(&mut self) -> std::result::Result<(), LoggerError> {
        self.transport
            .write_config(self.adc.address, self.adc.config_byte)
            .map_err(|e| map_transport_error(e.as_ref()))
    }

    fn read_channel(&mut self, channel: usize) -> std::result::Result<f64, LoggerError> {
        let cfg = self.adc.channel_config(channel);
        self.transport
            .write_config(self.adc.address, cfg)
            .map_err(|e| map_transport_error(e.as_ref()))?;
        self.clock.sleep(self.adc.settle);
        let word = self
            .transport
            .read_sample(self.adc.address, cfg)
            .map_err(|e| map_transport_error(e.as_ref()))?;
        Ok(self.calibration.word_to_amps(word))
    }

    /// Run one cycle: handshake if needed, then read every channel.
    pub fn poll_once(&mut self) -> PollOutcome {
        if self.state != TransportState::Ready {
            if let Err(error) = self.handshake() {
                tracing::error!(%error, "adc handshake failed");
                self.fault();
                return PollOutcome::HandshakeFailed(error);
            }
            tracing::info!(address = self.adc.address, "adc ready");
            self.state = TransportState::Ready;
        }

        let mut amps = Vec::with_capacity(self.adc.channels);
        for channel in 0..self.adc.channels {
            match self.read_channel(channel) {
                Ok(a) => {
                    tracing::trace!(channel, amps = a, "sample");
                    amps.push(a);
                }
                Err(error) => {
                    tracing::error!(channel, %error, "adc read failed");
                    self.fault();
                    return PollOutcome::ReadFailed { channel, error };
                }
            }
        }
        PollOutcome::Published(self.readings.publish(amps))
    }
}

impl<T: Transport + Send + 'static> SensorPoller<T> {
    /// Move the poller onto its own thread, polling every `adc.poll`.
    pub fn spawn(mut self) -> Result<Worker> {
        let period = self.adc.poll;
        Worker::spawn("sensor", move |stop| {
            while !stop.load(Ordering::Relaxed) {
                let _ = self.poll_once();
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                self.clock.sleep(period);
            }
        })
    }
}
