//! AutoTune calibration session and calibration file management

use anyhow::{Context, Result};
use raildriver_calibration::CalibrationError;
use raildriver_engine::{Dispatch, EngineConfig, InputEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::commands::{CalibrationCommands, deadline_after, interrupt_flag, open_device};
use crate::error::CliError;
use crate::output;

pub fn execute(cmd: &CalibrationCommands, config: &EngineConfig, json: bool) -> Result<()> {
    let store = config.calibration_store().map_err(CliError::from)?;

    match cmd {
        CalibrationCommands::Show => {
            let stored = store.exists();
            let data = store.load_or_default();
            output::print_calibration(&data, store.path(), stored, json);
        }
        CalibrationCommands::Reset => {
            let removed = store.delete().map_err(CliError::from)?;
            let message = if removed {
                format!("Removed {}", store.path().display())
            } else {
                format!("Nothing stored at {}", store.path().display())
            };
            output::print_success(&message, json);
        }
        CalibrationCommands::Path => {
            if json {
                output::print_success(&store.path().display().to_string(), true);
            } else {
                println!("{}", store.path().display());
            }
        }
    }
    Ok(())
}

/// Runs the read loop with AutoTune on for `secs`, then saves the bounds.
pub fn calibrate(mut config: EngineConfig, secs: u64, dry_run: bool, json: bool) -> Result<()> {
    config.auto_tune = true;
    let stop = interrupt_flag()?;
    let mut rd = open_device(config)?;

    let reports = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reports);
    rd.add_observer(move |_: &InputEvent| {
        counter.fetch_add(1, Ordering::Relaxed);
        Dispatch::Continue
    });

    if let Err(e) = rd.display().start_loader(true) {
        warn!(error = %e, "Failed to start loader");
    }
    rd.start()
        .map_err(CliError::from)
        .context("Failed to start read loop")?;

    if !json {
        eprintln!("Move every lever and switch through its full travel ({secs}s, Ctrl-C to finish early)");
    }
    let deadline = deadline_after(secs);
    while !stop.load(Ordering::Relaxed) && deadline.is_none_or(|d| Instant::now() < d) {
        thread::sleep(Duration::from_millis(100));
    }
    rd.stop();

    let seen = reports.load(Ordering::Relaxed);
    if seen == 0 {
        return Err(CliError::ValidationError(
            "no input arrived during the session; nothing to save".to_string(),
        )
        .into());
    }

    let data = rd.calibration();
    data.validate()
        .map_err(|e| CliError::ValidationError(e.to_string()))?;

    let store = rd
        .calibration_store()
        .cloned()
        .ok_or(CliError::Calibration(CalibrationError::NoConfigDir))?;
    if !dry_run {
        rd.save_calibration()
            .map_err(CliError::from)
            .context("Failed to save calibration")?;
        info!(path = %store.path().display(), changes = seen, "Calibration saved");
    }
    rd.close();

    output::print_calibration(&data, store.path(), !dry_run, json);
    Ok(())
}
