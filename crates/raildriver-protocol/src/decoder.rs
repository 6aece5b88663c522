//! Change detection over consecutive input reports

use crate::{AnalogChannel, INPUT_REPORT_LEN, InputField, InputFields, InputReport, InputState};
use tracing::debug;

/// Fields that differ from the previous decode, with the full state of the
/// cycle that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSet {
    pub changed: InputFields,
    pub state: InputState,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn contains(&self, field: InputField) -> bool {
        self.changed.has(field)
    }
}

/// Stateful decoder. The stored state starts zeroed, so the first valid
/// report flags every non-zero field.
#[derive(Debug, Clone)]
pub struct ReportDecoder {
    expected_len: usize,
    last: InputState,
}

impl Default for ReportDecoder {
    fn default() -> Self {
        Self::new(INPUT_REPORT_LEN)
    }
}

impl ReportDecoder {
    pub fn new(expected_len: usize) -> Self {
        Self {
            expected_len,
            last: InputState::default(),
        }
    }

    /// Decodes one report.
    ///
    /// Returns `None` for a report that fails validation; the stored state is
    /// left untouched. A valid report with nothing new gives an empty set.
    pub fn decode(&mut self, report: &[u8]) -> Option<ChangeSet> {
        let state = match InputReport::parse(report, self.expected_len) {
            Ok(state) => state,
            Err(e) => {
                debug!(error = %e, len = report.len(), "Discarding input report");
                return None;
            }
        };

        let changed = diff(&self.last, &state);
        self.last = state;
        Some(ChangeSet { changed, state })
    }

    pub fn last_state(&self) -> &InputState {
        &self.last
    }

    pub fn reset(&mut self) {
        self.last = InputState::default();
    }
}

fn diff(old: &InputState, new: &InputState) -> InputFields {
    let mut changed = InputFields::empty();

    for channel in AnalogChannel::ALL {
        if old.analog(channel) != new.analog(channel) {
            changed.insert_field(channel.field());
        }
    }

    changed.set(InputFields::TOP_ROW, old.top_row != new.top_row);
    changed.set(InputFields::BOTTOM_ROW, old.bottom_row != new.bottom_row);
    changed.set(InputFields::UP_DOWN, old.up_down != new.up_down);
    changed.set(InputFields::DPAD, old.dpad != new.dpad);
    changed.set(InputFields::AUX, old.aux != new.aux);

    changed
}
