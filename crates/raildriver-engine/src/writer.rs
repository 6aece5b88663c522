//! Serialized output channel

use crate::EngineResult;
use parking_lot::Mutex;
use raildriver_hid_common::HidTransport;
use raildriver_protocol::{LedFrame, led_report, speaker_report};
use std::sync::Arc;
use tracing::trace;

/// Single write path to the device. One report is in flight at a time.
pub struct ReportWriter {
    transport: Mutex<Arc<dyn HidTransport>>,
    output_len: usize,
}

impl ReportWriter {
    pub fn new(transport: Arc<dyn HidTransport>) -> Self {
        let output_len = transport.output_report_len();
        Self {
            transport: Mutex::new(transport),
            output_len,
        }
    }

    pub fn output_len(&self) -> usize {
        self.output_len
    }

    pub fn write_led(&self, frame: LedFrame) -> EngineResult<()> {
        let report = led_report(self.output_len, frame)?;
        self.write(&report)
    }

    pub fn write_speaker(&self, enabled: bool) -> EngineResult<()> {
        let report = speaker_report(self.output_len, enabled)?;
        self.write(&report)
    }

    /// Sends one prepared report.
    pub fn write(&self, report: &[u8]) -> EngineResult<()> {
        let transport = self.transport.lock();
        let written = transport.write_report(report)?;
        trace!(len = report.len(), written, "Wrote output report");
        Ok(())
    }
}
