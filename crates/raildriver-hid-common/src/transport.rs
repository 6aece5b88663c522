//! Blocking HID transport contract

use crate::{HidCommonResult, HidDeviceInfo};

/// Bidirectional, fixed-size report channel to one device.
///
/// Both directions take `&self` so one transport can be shared between a
/// reader thread and any number of writers. Implementations serialize access
/// to their own handles; callers that need whole-frame ordering across
/// writers must add their own lock on top.
pub trait HidTransport: Send + Sync {
    fn device_info(&self) -> &HidDeviceInfo;

    /// Blocks for up to `timeout_ms` waiting for one input report.
    ///
    /// An empty vector means the timeout elapsed without data.
    fn read_report(&self, timeout_ms: u32) -> HidCommonResult<Vec<u8>>;

    fn write_report(&self, data: &[u8]) -> HidCommonResult<usize>;

    fn is_open(&self) -> bool;

    /// Closes the handles. A read blocked in another thread returns
    /// [`HidCommonError::Disconnected`](crate::HidCommonError::Disconnected)
    /// once it observes the close.
    fn close(&self) -> HidCommonResult<()>;

    fn input_report_len(&self) -> usize {
        self.device_info().input_report_len
    }

    fn output_report_len(&self) -> usize {
        self.device_info().output_report_len
    }
}

pub mod mock {
    use super::*;
    use crate::HidCommonError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Condvar, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Shared {
        read_queue: Mutex<VecDeque<Vec<u8>>>,
        readable: Condvar,
        write_history: Mutex<Vec<Vec<u8>>>,
        connected: Mutex<bool>,
        fail_writes: Mutex<bool>,
    }

    /// In-memory transport for exercising readers and writers without hardware.
    ///
    /// Clones share the same queues, so a test can keep one handle while the
    /// code under test owns another.
    #[derive(Clone)]
    pub struct MockHidTransport {
        info: HidDeviceInfo,
        shared: Arc<Shared>,
    }

    impl MockHidTransport {
        pub fn new(info: HidDeviceInfo) -> Self {
            let shared = Shared {
                connected: Mutex::new(true),
                ..Default::default()
            };
            Self {
                info,
                shared: Arc::new(shared),
            }
        }

        pub fn queue_read(&self, data: Vec<u8>) {
            let mut queue = self
                .shared
                .read_queue
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            queue.push_back(data);
            self.shared.readable.notify_all();
        }

        pub fn pending_reads(&self) -> usize {
            self.shared
                .read_queue
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .len()
        }

        pub fn get_write_history(&self) -> Vec<Vec<u8>> {
            let history = self
                .shared
                .write_history
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            history.clone()
        }

        pub fn set_fail_writes(&self, fail: bool) {
            *self
                .shared
                .fail_writes
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = fail;
        }

        pub fn disconnect(&self) {
            let mut connected = self
                .shared
                .connected
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            *connected = false;
            drop(connected);
            let _queue = self
                .shared
                .read_queue
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            self.shared.readable.notify_all();
        }

        fn connected(&self) -> bool {
            *self
                .shared
                .connected
                .lock()
                .unwrap_or_else(|e| e.into_inner())
        }
    }

    impl HidTransport for MockHidTransport {
        fn device_info(&self) -> &HidDeviceInfo {
            &self.info
        }

        fn read_report(&self, timeout_ms: u32) -> HidCommonResult<Vec<u8>> {
            if !self.connected() {
                return Err(HidCommonError::Disconnected);
            }

            let queue = self
                .shared
                .read_queue
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            let (mut queue, _timeout) = self
                .shared
                .readable
                .wait_timeout_while(
                    queue,
                    Duration::from_millis(u64::from(timeout_ms)),
                    |q| q.is_empty() && self.connected(),
                )
                .unwrap_or_else(|e| e.into_inner());

            if !self.connected() {
                return Err(HidCommonError::Disconnected);
            }
            Ok(queue.pop_front().unwrap_or_default())
        }

        fn write_report(&self, data: &[u8]) -> HidCommonResult<usize> {
            if !self.connected() {
                return Err(HidCommonError::Disconnected);
            }
            if *self
                .shared
                .fail_writes
                .lock()
                .unwrap_or_else(|e| e.into_inner())
            {
                return Err(HidCommonError::WriteError("injected failure".to_string()));
            }

            let mut history = self
                .shared
                .write_history
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            history.push(data.to_vec());
            Ok(data.len())
        }

        fn is_open(&self) -> bool {
            self.connected()
        }

        fn close(&self) -> HidCommonResult<()> {
            self.disconnect();
            Ok(())
        }
    }
}
