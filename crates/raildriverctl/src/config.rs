//! Engine configuration from a file plus command-line overrides

use crate::error::CliError;
use clap::Args;
use raildriver_engine::EngineConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flags that override fields of the configuration file.
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// Engine configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true, env = "RAILDRIVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Calibration file to use instead of the per-user default
    #[arg(long, global = true)]
    pub calibration_file: Option<PathBuf>,

    /// Marquee step delay in milliseconds
    #[arg(long, global = true)]
    pub scroll_delay: Option<u32>,

    /// Read timeout in milliseconds
    #[arg(long, global = true)]
    pub poll: Option<u32>,

    /// Let out-of-range readings widen the calibration bounds
    #[arg(long, global = true)]
    pub auto_tune: bool,

    /// Pass byte-identical input reports through to the decoder
    #[arg(long, global = true)]
    pub keep_duplicates: bool,
}

/// Reads the configuration file, if one was given, then applies overrides.
pub fn load(overrides: &ConfigOverrides) -> Result<EngineConfig, CliError> {
    let mut config = match &overrides.config {
        Some(path) => read_file(path)?,
        None => EngineConfig::default(),
    };
    apply(&mut config, overrides);
    config.validate()?;
    debug!(?config, "Engine configuration");
    Ok(config)
}

fn read_file(path: &Path) -> Result<EngineConfig, CliError> {
    let text = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml" | "yml") => Ok(serde_yaml::from_str(&text)?),
        Some("json") => Ok(serde_json::from_str(&text)?),
        _ => Err(CliError::InvalidConfiguration(format!(
            "{}: expected a .yaml, .yml or .json file",
            path.display()
        ))),
    }
}

fn apply(config: &mut EngineConfig, overrides: &ConfigOverrides) {
    if let Some(path) = &overrides.calibration_file {
        config.calibration_path = Some(path.clone());
    }
    if let Some(delay) = overrides.scroll_delay {
        config.scroll_delay_ms = delay;
    }
    if let Some(poll) = overrides.poll {
        config.read_poll_ms = poll;
    }
    if overrides.auto_tune {
        config.auto_tune = true;
    }
    if overrides.keep_duplicates {
        config.suppress_identical_inputs = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn defaults_without_file() -> TestResult {
        let config = load(&ConfigOverrides::default())?;
        assert_eq!(config, EngineConfig::default());
        Ok(())
    }

    #[test]
    fn yaml_file_with_partial_fields() -> TestResult {
        let dir = TempDir::new()?;
        let path = dir.path().join("engine.yaml");
        fs::write(&path, "scroll_delay_ms: 500\nauto_tune: true\n")?;

        let config = load(&ConfigOverrides {
            config: Some(path),
            ..Default::default()
        })?;
        assert_eq!(config.scroll_delay_ms, 500);
        assert!(config.auto_tune);
        assert!(config.suppress_identical_inputs);
        Ok(())
    }

    #[test]
    fn json_file_then_overrides() -> TestResult {
        let dir = TempDir::new()?;
        let path = dir.path().join("engine.JSON");
        fs::write(&path, r#"{"read_poll_ms": 50, "calibration_path": "/a/cal.bin"}"#)?;

        let config = load(&ConfigOverrides {
            config: Some(path),
            calibration_file: Some(PathBuf::from("/b/cal.bin")),
            keep_duplicates: true,
            ..Default::default()
        })?;
        assert_eq!(config.read_poll_ms, 50);
        assert_eq!(config.calibration_path, Some(PathBuf::from("/b/cal.bin")));
        assert!(!config.suppress_identical_inputs);
        Ok(())
    }

    #[test]
    fn unknown_extension_rejected() -> TestResult {
        let dir = TempDir::new()?;
        let path = dir.path().join("engine.toml");
        fs::write(&path, "auto_tune = true")?;

        let result = load(&ConfigOverrides {
            config: Some(path),
            ..Default::default()
        });
        assert!(matches!(result, Err(CliError::InvalidConfiguration(_))));
        Ok(())
    }

    #[test]
    fn zero_poll_fails_validation() {
        let result = load(&ConfigOverrides {
            poll: Some(0),
            ..Default::default()
        });
        assert!(matches!(result, Err(CliError::InvalidConfiguration(_))));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() -> TestResult {
        let dir = TempDir::new()?;
        let path = dir.path().join("engine.yml");
        fs::write(&path, "scroll_delay_ms: [not, a, number]\n")?;

        let result = load(&ConfigOverrides {
            config: Some(path),
            ..Default::default()
        });
        assert!(matches!(result, Err(CliError::YamlError(_))));
        Ok(())
    }
}
