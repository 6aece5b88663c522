//! Error types for raildriverctl

use raildriver_calibration::CalibrationError;
use raildriver_engine::EngineError;
use raildriver_hid_common::HidCommonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Device error: {0}")]
    Device(#[source] EngineError),

    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl CliError {
    /// Process exit status for this error. Anything not listed exits with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::DeviceNotFound(_) => 2,
            CliError::InvalidConfiguration(_) | CliError::YamlError(_) => 3,
            CliError::ValidationError(_) | CliError::JsonError(_) => 4,
            CliError::Device(_) => 5,
            CliError::Calibration(_) => 6,
            CliError::IoError(_) => 1,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Transport(HidCommonError::DeviceNotFound(what)) => {
                CliError::DeviceNotFound(what)
            }
            EngineError::Config(reason) => CliError::InvalidConfiguration(reason),
            EngineError::Calibration(e) => CliError::Calibration(e),
            other => CliError::Device(other),
        }
    }
}
