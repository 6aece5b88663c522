//! Live input monitor

use anyhow::{Context, Result};
use crossbeam::channel::{self, RecvTimeoutError};
use raildriver_engine::{Dispatch, EngineConfig, InputEvent};
use raildriver_protocol::InputFields;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::commands::{deadline_after, interrupt_flag, open_device};
use crate::error::CliError;
use crate::output;

const POLL: Duration = Duration::from_millis(100);

pub fn execute(config: EngineConfig, duration: Option<u64>, echo: bool, json: bool) -> Result<()> {
    let stop = interrupt_flag()?;
    let mut rd = open_device(config)?;

    let (tx, events) = channel::unbounded::<InputEvent>();
    rd.add_observer(move |event: &InputEvent| {
        // The receiver only goes away once the monitor is shutting down.
        if tx.send(event.clone()).is_err() {
            return Dispatch::Cancel;
        }
        Dispatch::Continue
    });
    rd.start().map_err(CliError::from).context("Failed to start read loop")?;

    if !json {
        eprintln!(
            "Monitoring {} (Ctrl-C to stop)",
            rd.device_info().display_name()
        );
    }

    let deadline = duration.and_then(deadline_after);
    let mut seen = 0usize;
    while !stop.load(Ordering::Relaxed) && deadline.is_none_or(|d| Instant::now() < d) {
        let event = match events.recv_timeout(POLL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        seen = seen.saturating_add(1);
        output::print_event(&event, json);

        if echo && event.changed.contains(InputFields::THROTTLE) {
            let percent = (event.snapshot.throttle.processed * 100.0).round();
            if let Err(e) = rd.display().set_number(percent) {
                warn!(error = %e, "Failed to echo throttle");
            }
        }
    }

    info!(events = seen, "Monitor finished");
    rd.close();
    Ok(())
}
