//! Device information types for HID devices

use serde::{Deserialize, Serialize};

/// Identity of one HID interface plus the report sizes it advertises.
///
/// The report lengths include the leading report-id slot, so a RailDriver
/// advertises 15 input bytes and 9 output bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidDeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product_name: Option<String>,
    pub path: String,
    pub input_report_len: usize,
    pub output_report_len: usize,
}

impl HidDeviceInfo {
    pub fn new(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
        Self {
            vendor_id,
            product_id,
            serial_number: None,
            manufacturer: None,
            product_name: None,
            path: path.into(),
            input_report_len: 0,
            output_report_len: 0,
        }
    }

    pub fn with_report_lengths(mut self, input: usize, output: usize) -> Self {
        self.input_report_len = input;
        self.output_report_len = output;
        self
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn matches_vendor(&self, vendor_id: u16) -> bool {
        self.vendor_id == vendor_id
    }

    pub fn display_name(&self) -> String {
        self.product_name
            .clone()
            .or_else(|| self.manufacturer.clone())
            .unwrap_or_else(|| format!("{:04x}:{:04x}", self.vendor_id, self.product_id))
    }
}
