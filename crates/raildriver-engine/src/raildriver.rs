//! Handle for one connected RailDriver

use crate::{
    DeviceController, DeviceSnapshot, EngineConfig, EngineError, EngineResult, InputEvent,
    InputObserver, LedDisplay, ObserverId, ReportWriter,
};
use hidapi::HidApi;
use raildriver_calibration::{CalibrationData, CalibrationError, CalibrationStore};
use raildriver_hid_common::{HidApiTransport, HidCommonError, HidDeviceInfo, HidTransport};
use raildriver_protocol::{INPUT_REPORT_LEN, OUTPUT_REPORT_LEN, PIE_VENDOR_ID};
use std::sync::Arc;
use tracing::{info, warn};

/// Owns the transport, the read loop and the display for one device.
///
/// Teardown runs in a fixed order: the display is shut down, then the read
/// loop is stopped, then the transport is closed. [`close`](Self::close)
/// does this explicitly; dropping the handle does it too.
pub struct RailDriver {
    transport: Arc<dyn HidTransport>,
    writer: Arc<ReportWriter>,
    display: LedDisplay,
    controller: DeviceController,
    store: Option<CalibrationStore>,
    closed: bool,
}

impl RailDriver {
    /// Opens the first attached PIE device. Fails at once if there is none.
    pub fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let api = HidApi::new().map_err(|e| HidCommonError::OpenError(e.to_string()))?;
        let transport =
            HidApiTransport::open_first(&api, PIE_VENDOR_ID, INPUT_REPORT_LEN, OUTPUT_REPORT_LEN)?;
        Self::with_transport(Arc::new(transport), config)
    }

    /// Builds the handle over an already open transport. Calibration is
    /// loaded from the configured store, falling back to defaults.
    pub fn with_transport(
        transport: Arc<dyn HidTransport>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;

        let store = match config.calibration_store() {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(error = %e, "No calibration store, using defaults");
                None
            }
        };
        let calibration = store
            .as_ref()
            .map(CalibrationStore::load_or_default)
            .unwrap_or_default();

        let writer = Arc::new(ReportWriter::new(Arc::clone(&transport)));
        let display = LedDisplay::new(Arc::clone(&writer), config.scroll_delay_ms)?;
        let controller = DeviceController::new(Arc::clone(&transport), config, calibration)?;

        info!(device = %transport.device_info().display_name(), "RailDriver ready");
        Ok(Self {
            transport,
            writer,
            display,
            controller,
            store,
            closed: false,
        })
    }

    pub fn device_info(&self) -> &HidDeviceInfo {
        self.transport.device_info()
    }

    /// Starts the read loop.
    pub fn start(&mut self) -> EngineResult<()> {
        if self.closed {
            return Err(EngineError::Transport(HidCommonError::Disconnected));
        }
        self.controller.start()
    }

    /// Stops the read loop. The display keeps working.
    pub fn stop(&mut self) {
        self.controller.stop();
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn display(&self) -> &LedDisplay {
        &self.display
    }

    pub fn set_speaker(&self, enabled: bool) -> EngineResult<()> {
        self.writer.write_speaker(enabled)
    }

    /// Registers an observer after those already present.
    pub fn add_observer<O: InputObserver + 'static>(&self, observer: O) -> ObserverId {
        self.controller.observers().add(Arc::new(observer))
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.controller.observers().remove(id)
    }

    /// Runs for events no observer handled or cancelled.
    pub fn set_default_handler<F>(&self, handler: F)
    where
        F: Fn(&InputEvent) + Send + Sync + 'static,
    {
        self.controller
            .observers()
            .set_default_handler(Some(Arc::new(handler)));
    }

    pub fn clear_default_handler(&self) {
        self.controller.observers().set_default_handler(None);
    }

    pub fn snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.controller.snapshot()
    }

    /// Current bounds, including anything AutoTune has widened.
    pub fn calibration(&self) -> CalibrationData {
        self.controller.calibration()
    }

    pub fn set_calibration(&self, calibration: CalibrationData) {
        self.controller.set_calibration(calibration);
    }

    pub fn calibration_store(&self) -> Option<&CalibrationStore> {
        self.store.as_ref()
    }

    /// Writes the current bounds to the calibration store.
    pub fn save_calibration(&self) -> EngineResult<()> {
        let store = self.store.as_ref().ok_or(CalibrationError::NoConfigDir)?;
        store.save(&self.calibration())?;
        Ok(())
    }

    /// Tears everything down. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.display.shutdown();
        self.controller.stop();
        if let Err(e) = self.transport.close() {
            warn!(error = %e, "Failed to close transport");
        }
        info!("RailDriver closed");
    }
}

impl Drop for RailDriver {
    fn drop(&mut self) {
        self.close();
    }
}
