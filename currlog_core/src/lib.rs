#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Current logging engine (hardware-agnostic).
//!
//! All hardware interactions go through the `currlog_traits` seams, so the
//! whole engine runs against simulated devices or the recording fakes in
//! [`mocks`].
//!
//! ## Architecture
//!
//! - **Conversion**: ADC word to calibrated RMS amperes (`calibration`)
//! - **Snapshot**: whole-set swap of the latest readings, single writer (`snapshot`)
//! - **Workers**: sensor polling, CSV recording, buzzer patterns, each on its own
//!   thread with a typed command channel (`sensor`, `recorder`, `alert`)
//! - **Controller**: LED bar, overcurrent detection, button debounce, startup and
//!   shutdown sequencing (`controller`)
//! - **Indicators**: status LED with fail-safe bursts and the LED bar (`indicator`, `bar`)

pub mod alert;
pub mod bar;
pub mod calibration;
pub mod config;
pub mod controller;
mod conversions;
pub mod error;
pub mod hw_error;
pub mod indicator;
pub mod mocks;
pub mod notify;
pub mod recorder;
pub mod sensor;
pub mod snapshot;
pub mod worker;

pub use alert::{AlertCommand, AlertHandle, AlertRequest, Alerter};
pub use bar::{LedBar, lit_count};
pub use calibration::Calibration;
pub use config::{
    AdcCfg, AlertCfg, Boundary, ChannelPolicy, DisplayCfg, EngineCfg, NotifyTarget, RecorderCfg,
    Timing,
};
pub use controller::{ButtonAction, Clocks, Controller, Devices, StepReport};
pub use error::{LoggerError, Result};
pub use indicator::{BlinkPattern, StatusLed};
pub use notify::{Dispatch, NotifyDispatcher};
pub use recorder::{Recorder, RecorderCommand, RecorderHandle, TickOutcome};
pub use sensor::{PollOutcome, SensorPoller, TransportState};
pub use snapshot::{ReadingSet, SharedReadings};
