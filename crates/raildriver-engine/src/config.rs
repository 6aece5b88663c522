//! Engine configuration

use crate::{EngineError, EngineResult};
use raildriver_calibration::CalibrationStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Scroll step granularity of the LED marquee.
pub const SCROLL_STEP_MS: u32 = 100;

pub const DEFAULT_SCROLL_DELAY_MS: u32 = 300;

pub const DEFAULT_READ_POLL_MS: u32 = 100;

/// Settings for one [`RailDriver`](crate::RailDriver). Every field is
/// optional when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Skip input reports that are byte-for-byte the previous one.
    pub suppress_identical_inputs: bool,
    /// Marquee step delay. Rounded down to a multiple of 100 ms, minimum 100.
    pub scroll_delay_ms: u32,
    /// Upper bound on one blocking read, and so on how long `stop()` waits
    /// for the read loop to notice.
    pub read_poll_ms: u32,
    /// Let out-of-range readings widen the calibration bounds.
    pub auto_tune: bool,
    /// Calibration file. `None` uses the per-user default location.
    pub calibration_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suppress_identical_inputs: true,
            scroll_delay_ms: DEFAULT_SCROLL_DELAY_MS,
            read_poll_ms: DEFAULT_READ_POLL_MS,
            auto_tune: false,
            calibration_path: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.read_poll_ms == 0 {
            return Err(EngineError::Config(
                "read_poll_ms must be above zero".to_string(),
            ));
        }
        if self
            .calibration_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(EngineError::Config(
                "calibration_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The store named by `calibration_path`, or the default one.
    pub fn calibration_store(&self) -> EngineResult<CalibrationStore> {
        match &self.calibration_path {
            Some(path) => Ok(CalibrationStore::new(path.clone())),
            None => Ok(CalibrationStore::open_default()?),
        }
    }
}

/// Rounds `delay_ms` down to the scroll granularity, never below one step.
pub fn normalize_scroll_delay(delay_ms: u32) -> u32 {
    (delay_ms / SCROLL_STEP_MS).max(1).saturating_mul(SCROLL_STEP_MS)
}
