//! RailDriver engine
//!
//! Ties the transport, decoder and calibration crates together. A
//! [`DeviceController`] runs the read loop and hands every change to the
//! registered observers as an [`InputEvent`]. An [`LedDisplay`] drives the
//! three-digit LED display, including scrolling text, over a
//! [`ReportWriter`] shared with the speaker command. [`RailDriver`] owns all
//! of it for one device.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod controller;
pub mod display;
pub mod observer;
pub mod raildriver;
pub mod snapshot;
pub mod writer;

pub use config::EngineConfig;
pub use controller::DeviceController;
pub use display::{Display, LedDisplay, MarqueeEnded, MarqueeState};
pub use observer::{
    DefaultHandler, Dispatch, InputEvent, InputObserver, ObserverId, ObserverRegistry,
};
pub use raildriver::RailDriver;
pub use snapshot::{DeviceSnapshot, NormalizedValue};
pub use writer::ReportWriter;

use raildriver_calibration::CalibrationError;
use raildriver_hid_common::HidCommonError;
use raildriver_protocol::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Transport error: {0}")]
    Transport(#[from] HidCommonError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Read loop already running")]
    AlreadyRunning,

    #[error("LED display has been shut down")]
    DisplayDetached,

    #[error("Failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;
