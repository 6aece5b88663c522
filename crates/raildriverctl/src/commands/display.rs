//! LED display commands

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use raildriver_engine::{EngineConfig, MarqueeEnded, RailDriver};
use raildriver_protocol::segment::{known_characters, unsupported_alpha_chars};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::commands::{DisplayCommands, deadline_after, interrupt_flag, open_device};
use crate::error::CliError;
use crate::output;

const TICK: Duration = Duration::from_millis(50);

pub fn execute(cmd: &DisplayCommands, config: EngineConfig, json: bool) -> Result<()> {
    let stop = interrupt_flag()?;
    let mut rd = open_device(config)?;

    match cmd {
        DisplayCommands::Text { text, hold } => {
            rd.display()
                .set_text(text)
                .map_err(CliError::from)
                .context("Failed to show text")?;
            hold_for(&stop, *hold, None);
        }
        DisplayCommands::Number { value, hold } => {
            rd.display()
                .set_number(*value)
                .map_err(CliError::from)
                .context("Failed to show number")?;
            hold_for(&stop, *hold, None);
        }
        DisplayCommands::Marquee { text, once, hold } => {
            let events = rd.display().marquee_events();
            rd.display()
                .set_marquee_text(text, !*once)
                .map_err(CliError::from)
                .context("Failed to start marquee")?;
            // A single pass runs to its end however long that takes.
            let hold = if *once { u64::MAX } else { *hold };
            hold_for(&stop, hold, (*once).then_some(&events));
        }
        DisplayCommands::Loader { hold } => {
            rd.display()
                .start_loader(true)
                .map_err(CliError::from)
                .context("Failed to start loader")?;
            hold_for(&stop, *hold, None);
            end_loader(&rd)?;
        }
        DisplayCommands::Clear => {
            rd.display()
                .clear()
                .map_err(CliError::from)
                .context("Failed to clear display")?;
        }
    }

    rd.close();
    output::print_success("Display updated", json);
    Ok(())
}

fn end_loader(rd: &RailDriver) -> Result<()> {
    rd.display()
        .end_loader()
        .map_err(CliError::from)
        .context("Failed to end loader")?;
    Ok(())
}

/// Sleeps until `secs` pass, Ctrl-C is pressed, or a marquee pass ends.
fn hold_for(stop: &AtomicBool, secs: u64, ended: Option<&Receiver<MarqueeEnded>>) {
    let deadline = deadline_after(secs);
    while !stop.load(Ordering::Relaxed) && deadline.is_none_or(|d| Instant::now() < d) {
        match ended {
            Some(events) => {
                if events.recv_timeout(TICK).is_ok() {
                    return;
                }
            }
            None => thread::sleep(TICK),
        }
    }
}

pub fn chars(json: bool) -> Result<()> {
    let known: String = known_characters().collect();
    let unsupported: String = unsupported_alpha_chars().collect();
    output::print_characters(&known, &unsupported, json);
    Ok(())
}
