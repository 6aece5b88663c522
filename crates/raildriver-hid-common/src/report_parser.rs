//! HID report parsing utilities

use crate::{HidCommonError, HidCommonResult};

/// Cursor over a borrowed report buffer.
pub struct ReportParser<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ReportParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            position: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn read_u8(&mut self) -> HidCommonResult<u8> {
        let value = self.peek_u8()?;
        self.position = self.position.saturating_add(1);
        Ok(value)
    }

    pub fn peek_u8(&self) -> HidCommonResult<u8> {
        self.buffer
            .get(self.position)
            .copied()
            .ok_or_else(|| HidCommonError::InvalidReport("Unexpected end of data".to_string()))
    }

    /// Reads `N` consecutive bytes into a fixed array.
    pub fn read_array<const N: usize>(&mut self) -> HidCommonResult<[u8; N]> {
        let end = self.position.saturating_add(N);
        let slice = self
            .buffer
            .get(self.position..end)
            .ok_or_else(|| HidCommonError::InvalidReport("Unexpected end of data".to_string()))?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.position = end;
        Ok(out)
    }

    pub fn skip(&mut self, count: usize) {
        self.position = self.position.saturating_add(count).min(self.buffer.len());
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}

/// Builds a zero-filled output report of a fixed length.
///
/// Writes outside the report are rejected rather than growing the buffer,
/// since the device only accepts reports of exactly the advertised size.
pub struct ReportBuilder {
    buffer: Vec<u8>,
}

impl ReportBuilder {
    pub fn new(len: usize) -> Self {
        Self {
            buffer: vec![0u8; len],
        }
    }

    pub fn put_u8(&mut self, offset: usize, value: u8) -> HidCommonResult<&mut Self> {
        let len = self.buffer.len();
        let slot = self
            .buffer
            .get_mut(offset)
            .ok_or(HidCommonError::InvalidReportSize {
                expected: offset.saturating_add(1),
                actual: len,
            })?;
        *slot = value;
        Ok(self)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
