//! Command implementations for raildriverctl

pub mod calibration;
pub mod device;
pub mod display;
pub mod monitor;

use crate::error::CliError;
use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use raildriver_engine::{EngineConfig, RailDriver};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Subcommand)]
pub enum DisplayCommands {
    /// Show text; anything over three characters scrolls
    Text {
        text: String,
        /// Seconds to keep the text up before the display is blanked
        #[arg(long, default_value = "5")]
        hold: u64,
    },

    /// Show a number, clamped to -99..=999
    Number {
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Seconds to keep the number up before the display is blanked
        #[arg(long, default_value = "5")]
        hold: u64,
    },

    /// Scroll text across the display
    Marquee {
        text: String,
        /// Scroll through once, then blank the display
        #[arg(long)]
        once: bool,
        /// Stop after this many seconds when repeating
        #[arg(long, default_value = "10")]
        hold: u64,
    },

    /// Run the loader animation
    Loader {
        /// Length of the animation in seconds
        #[arg(long, default_value = "3")]
        hold: u64,
    },

    /// Blank the display
    Clear,
}

#[derive(Subcommand)]
pub enum CalibrationCommands {
    /// Print the stored bounds, or the defaults when nothing is stored
    Show,
    /// Delete the stored calibration
    Reset,
    /// Print the calibration file location
    Path,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SpeakerState {
    On,
    Off,
}

/// Opens the first attached panel, turning an empty bus into
/// [`CliError::DeviceNotFound`].
pub(crate) fn open_device(config: EngineConfig) -> Result<RailDriver> {
    let rd = RailDriver::open(config)
        .map_err(CliError::from)
        .context("Failed to open RailDriver")?;
    info!(device = %rd.device_info().display_name(), "Opened device");
    Ok(rd)
}

/// Flag set by Ctrl-C for long-running commands.
pub(crate) fn interrupt_flag() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("Failed to install Ctrl-C handler")?;
    Ok(stop)
}

/// `secs` from now, or `None` when that instant cannot be represented.
/// `None` is treated as "no deadline" by every wait loop.
pub(crate) fn deadline_after(secs: u64) -> Option<Instant> {
    Instant::now().checked_add(Duration::from_secs(secs))
}
