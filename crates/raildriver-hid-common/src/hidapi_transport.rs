//! hidapi-backed transport
//!
//! hidapi strips the unnumbered report id from input reports on every
//! platform, so [`HidApiTransport::read_report`] puts a `0x00` back in byte 0
//! before handing the frame up. Output frames keep byte 0 as the report id and
//! are passed to hidapi untouched.

use crate::{HidCommonError, HidCommonResult, HidDeviceInfo, HidTransport};
use hidapi::{HidApi, HidDevice};
use parking_lot::Mutex;
use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Enumerates every interface reported by hidapi with the given vendor id.
///
/// Report lengths are left at zero; hidapi does not expose them.
pub fn list_devices(api: &HidApi, vendor_id: u16) -> Vec<HidDeviceInfo> {
    api.device_list()
        .filter(|d| d.vendor_id() == vendor_id)
        .map(|d| {
            let mut info = HidDeviceInfo::new(
                d.vendor_id(),
                d.product_id(),
                d.path().to_string_lossy().into_owned(),
            );
            info.serial_number = d.serial_number().map(str::to_string);
            info.manufacturer = d.manufacturer_string().map(str::to_string);
            info.product_name = d.product_string().map(str::to_string);
            info
        })
        .collect()
}

/// Two hidapi handles on one device path: one for the read loop, one for
/// writers.
pub struct HidApiTransport {
    info: HidDeviceInfo,
    reader: Mutex<Option<HidDevice>>,
    writer: Mutex<Option<HidDevice>>,
    closed: AtomicBool,
}

impl HidApiTransport {
    /// Opens both handles on `info.path`. `info` must carry the report lengths.
    pub fn open_path(api: &HidApi, info: HidDeviceInfo) -> HidCommonResult<Self> {
        let path = CString::new(info.path.clone())
            .map_err(|e| HidCommonError::OpenError(format!("invalid device path: {e}")))?;

        let reader = api
            .open_path(&path)
            .map_err(|e| HidCommonError::OpenError(format!("{}: {e}", info.path)))?;
        let writer = api
            .open_path(&path)
            .map_err(|e| HidCommonError::OpenError(format!("{}: {e}", info.path)))?;

        info!(
            device = %info.display_name(),
            path = %info.path,
            input_len = info.input_report_len,
            output_len = info.output_report_len,
            "Opened HID device"
        );

        Ok(Self {
            info,
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            closed: AtomicBool::new(false),
        })
    }

    /// Opens the first interface with `vendor_id`. Fails immediately when none
    /// is attached.
    pub fn open_first(
        api: &HidApi,
        vendor_id: u16,
        input_report_len: usize,
        output_report_len: usize,
    ) -> HidCommonResult<Self> {
        let info = list_devices(api, vendor_id)
            .into_iter()
            .next()
            .ok_or_else(|| HidCommonError::DeviceNotFound(format!("vendor {vendor_id:04x}")))?
            .with_report_lengths(input_report_len, output_report_len);
        Self::open_path(api, info)
    }
}

impl HidTransport for HidApiTransport {
    fn device_info(&self) -> &HidDeviceInfo {
        &self.info
    }

    fn read_report(&self, timeout_ms: u32) -> HidCommonResult<Vec<u8>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HidCommonError::Disconnected);
        }

        let guard = self.reader.lock();
        let device = guard.as_ref().ok_or(HidCommonError::Disconnected)?;

        let len = self.info.input_report_len.max(2);
        let mut buf = vec![0u8; len];
        let timeout = i32::try_from(timeout_ms).unwrap_or(i32::MAX);
        let payload = buf.get_mut(1..).ok_or(HidCommonError::InvalidReportSize {
            expected: len,
            actual: 0,
        })?;
        let read = device
            .read_timeout(payload, timeout)
            .map_err(|e| HidCommonError::ReadError(e.to_string()))?;
        drop(guard);

        if self.closed.load(Ordering::Acquire) {
            return Err(HidCommonError::Disconnected);
        }
        if read == 0 {
            return Ok(Vec::new());
        }

        buf.truncate(read.saturating_add(1));
        Ok(buf)
    }

    fn write_report(&self, data: &[u8]) -> HidCommonResult<usize> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HidCommonError::Disconnected);
        }

        let expected = self.info.output_report_len;
        if expected != 0 && data.len() != expected {
            return Err(HidCommonError::InvalidReportSize {
                expected,
                actual: data.len(),
            });
        }

        let guard = self.writer.lock();
        let device = guard.as_ref().ok_or(HidCommonError::Disconnected)?;
        device
            .write(data)
            .map_err(|e| HidCommonError::WriteError(e.to_string()))
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    fn close(&self) -> HidCommonResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        // A reader blocked in read_timeout holds this lock for at most one
        // poll slice.
        self.writer.lock().take();
        self.reader.lock().take();
        debug!(path = %self.info.path, "Closed HID device");
        Ok(())
    }
}
