//! Background read loop

use crate::{
    DeviceSnapshot, EngineConfig, EngineError, EngineResult, InputEvent, ObserverRegistry,
};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::RwLock;
use raildriver_calibration::CalibrationData;
use raildriver_hid_common::{HidCommonError, HidTransport};
use raildriver_protocol::ReportDecoder;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const READER_THREAD: &str = "raildriver-reader";

type LatestSnapshot = Arc<RwLock<Option<Arc<DeviceSnapshot>>>>;

/// Everything the read thread owns or shares.
struct ReaderContext {
    transport: Arc<dyn HidTransport>,
    observers: Arc<ObserverRegistry>,
    latest: LatestSnapshot,
    published: Arc<RwLock<CalibrationData>>,
    replacements: Receiver<CalibrationData>,
    running: Arc<AtomicBool>,
    poll_ms: u32,
    suppress_identical: bool,
}

/// Owns the read loop for one transport.
///
/// The loop is the only writer of calibration state. Readers get the copy
/// published after each cycle that changed it.
pub struct DeviceController {
    transport: Arc<dyn HidTransport>,
    config: EngineConfig,
    observers: Arc<ObserverRegistry>,
    latest: LatestSnapshot,
    published: Arc<RwLock<CalibrationData>>,
    replace_tx: Option<Sender<CalibrationData>>,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl DeviceController {
    pub fn new(
        transport: Arc<dyn HidTransport>,
        config: EngineConfig,
        mut calibration: CalibrationData,
    ) -> EngineResult<Self> {
        config.validate()?;
        calibration.set_auto_tune(config.auto_tune);
        Ok(Self {
            transport,
            config,
            observers: Arc::new(ObserverRegistry::new()),
            latest: Arc::new(RwLock::new(None)),
            published: Arc::new(RwLock::new(calibration)),
            replace_tx: None,
            running: Arc::new(AtomicBool::new(false)),
            reader: None,
        })
    }

    pub fn observers(&self) -> &Arc<ObserverRegistry> {
        &self.observers
    }

    /// Starts the read thread.
    pub fn start(&mut self) -> EngineResult<()> {
        if self.running.load(Ordering::Acquire) {
            return Err(EngineError::AlreadyRunning);
        }
        // A thread left over from a loop that ended on its own.
        self.join_reader();

        let (replace_tx, replacements) = channel::unbounded();
        let ctx = ReaderContext {
            transport: Arc::clone(&self.transport),
            observers: Arc::clone(&self.observers),
            latest: Arc::clone(&self.latest),
            published: Arc::clone(&self.published),
            replacements,
            running: Arc::clone(&self.running),
            poll_ms: self.config.read_poll_ms,
            suppress_identical: self.config.suppress_identical_inputs,
        };

        self.running.store(true, Ordering::Release);
        let reader = thread::Builder::new()
            .name(READER_THREAD.to_string())
            .spawn(move || read_loop(ctx))
            .map_err(|source| {
                self.running.store(false, Ordering::Release);
                EngineError::ThreadSpawn {
                    name: READER_THREAD,
                    source,
                }
            })?;

        self.reader = Some(reader);
        self.replace_tx = Some(replace_tx);
        info!(
            device = %self.transport.device_info().display_name(),
            poll_ms = self.config.read_poll_ms,
            "Read loop started"
        );
        Ok(())
    }

    /// Clears the running flag and waits for the thread. The loop notices
    /// within one poll slice.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::AcqRel) && self.reader.is_none() {
            return;
        }
        info!("Stopping read loop");
        self.join_reader();
        self.replace_tx = None;
    }

    fn join_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            match reader.join() {
                Ok(()) => info!("Read thread stopped cleanly"),
                Err(_) => error!("Read thread panicked"),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Most recent snapshot, if any report has changed anything yet.
    pub fn snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.latest.read().clone()
    }

    /// Calibration as of the last completed cycle.
    pub fn calibration(&self) -> CalibrationData {
        *self.published.read()
    }

    /// Swaps in new bounds, with the configured AutoTune setting applied. A
    /// running loop uses them from the next report that changes anything.
    pub fn set_calibration(&self, mut calibration: CalibrationData) {
        calibration.set_auto_tune(self.config.auto_tune);
        *self.published.write() = calibration;
        if let Some(tx) = &self.replace_tx
            && tx.send(calibration).is_err()
        {
            debug!("Read loop gone, calibration applies on next start");
        }
    }
}

impl Drop for DeviceController {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("Device controller dropped while still running - forcing stop");
            self.stop();
        }
    }
}

fn read_loop(ctx: ReaderContext) {
    let mut decoder = ReportDecoder::new(ctx.transport.input_report_len());
    let mut calibration = *ctx.published.read();
    // The decoder starts from zero, so the first snapshot evaluates everything.
    let mut previous: Option<Arc<DeviceSnapshot>> = None;
    let mut last_raw: Vec<u8> = Vec::new();

    while ctx.running.load(Ordering::Acquire) {
        let report = match ctx.transport.read_report(ctx.poll_ms) {
            Ok(report) => report,
            Err(HidCommonError::Disconnected) if !ctx.running.load(Ordering::Acquire) => break,
            Err(e) => {
                warn!(error = %e, "Input read failed");
                // Keep a failing transport to the poll cadence.
                thread::sleep(Duration::from_millis(u64::from(ctx.poll_ms)));
                continue;
            }
        };
        if report.is_empty() {
            continue;
        }

        if ctx.suppress_identical {
            if report == last_raw {
                continue;
            }
            last_raw.clone_from(&report);
        }

        let Some(changes) = decoder.decode(&report) else {
            continue;
        };
        if changes.is_empty() {
            continue;
        }

        let mut replaced = false;
        while let Ok(replacement) = ctx.replacements.try_recv() {
            calibration = replacement;
            replaced = true;
        }
        let before = calibration;
        // New bounds apply to every lever, not only the ones that moved.
        let carried = if replaced { None } else { previous.as_deref() };
        let snapshot = Arc::new(DeviceSnapshot::from_changes(
            carried,
            &changes,
            &mut calibration,
        ));
        if calibration != before {
            debug!("AutoTune widened calibration bounds");
        }
        if replaced || calibration != before {
            *ctx.published.write() = calibration;
        }

        *ctx.latest.write() = Some(Arc::clone(&snapshot));
        previous = Some(Arc::clone(&snapshot));

        ctx.observers.dispatch(&InputEvent {
            snapshot,
            changed: changes.changed,
        });
    }

    info!("Read loop stopping");
}
