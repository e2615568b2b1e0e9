//! RecordTracker - 合計視聴者数の最高 / 最低記録

use chrono::{DateTime, Utc};

use crate::domain::DestinationState;
use crate::render::format_timestamp;

/// Which records a cycle total replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub maximum: bool,
    pub minimum: bool,
}

impl RecordUpdate {
    /// True when the state changed and must be persisted.
    pub fn changed(self) -> bool {
        self.maximum || self.minimum
    }
}

/// Ratchets the persisted records with this cycle's total.
///
/// The maximum is replaced when absent or strictly exceeded. The minimum only
/// moves when `track_minimum` is set, and only downward.
pub fn observe_total(state: &mut DestinationState, total: u64, at: DateTime<Utc>) -> RecordUpdate {
    let mut update = RecordUpdate::default();

    if state.running_maximum.is_none_or(|max| total > max) {
        state.running_maximum = Some(total);
        state.running_maximum_timestamp = Some(format_timestamp(at));
        update.maximum = true;
    }

    if state.track_minimum && state.running_minimum.is_none_or(|min| total < min) {
        state.running_minimum = Some(total);
        state.running_minimum_timestamp = Some(format_timestamp(at));
        update.minimum = true;
    }

    update
}
