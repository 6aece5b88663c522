//! Calibration file on disk

use crate::{CalibrationData, CalibrationError, CalibrationResult};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CALIBRATION_DIR: &str = "DVRailDriver";
pub const CALIBRATION_FILE: &str = "calibration.bin";

/// One calibration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationStore {
    path: PathBuf,
}

impl CalibrationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/DVRailDriver/calibration.bin` for the current user.
    pub fn default_path() -> CalibrationResult<PathBuf> {
        let base = dirs::config_dir().ok_or(CalibrationError::NoConfigDir)?;
        Ok(base.join(CALIBRATION_DIR).join(CALIBRATION_FILE))
    }

    pub fn open_default() -> CalibrationResult<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the file, failing on any I/O or length problem.
    pub fn load(&self) -> CalibrationResult<CalibrationData> {
        let file = File::open(&self.path)?;
        CalibrationData::read_from(&mut BufReader::new(file))
    }

    /// Reads the file, falling back to defaults when it is missing, short or
    /// unreadable. Records with out-of-order bounds are reset individually.
    pub fn load_or_default(&self) -> CalibrationData {
        match self.load() {
            Ok(data) => {
                debug!(path = %self.path.display(), "Loaded calibration");
                data.sanitized()
            }
            Err(CalibrationError::IoError(e)) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No calibration file, using defaults");
                CalibrationData::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable calibration, using defaults");
                CalibrationData::default()
            }
        }
    }

    /// Writes `data`, creating the parent directory when needed.
    pub fn save(&self, data: &CalibrationData) -> CalibrationResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.path)?);
        data.write_to(&mut writer)?;
        writer.flush()?;
        info!(path = %self.path.display(), "Saved calibration");
        Ok(())
    }

    /// Removes the file. Returns `false` when there was nothing to remove.
    pub fn delete(&self) -> CalibrationResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Deleted calibration");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
