use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use tutorsync_core::{
    errors::{ScheduleError, ScheduleResult},
    models::schedule::ScheduleOccurrence,
    store::{OccurrenceStore, SchedulingStore},
};

/// Finds upcoming sessions that still lack an exercise.
pub struct GapScanner {
    store: Arc<dyn SchedulingStore>,
}

impl GapScanner {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    /// Unassigned, visible, teaching occurrences with `window_start < date <= window_end`.
    /// Read-only.
    pub async fn scan(&self, window_start: NaiveDate, window_end: NaiveDate) -> ScheduleResult<Vec<ScheduleOccurrence>> {
        if window_end < window_start {
            return Err(ScheduleError::Validation(format!(
                "Scan window end {} is before its start {}",
                window_end, window_start
            )));
        }

        let found = self.store.unassigned_occurrences(window_start, window_end).await?;
        debug!("Found {} unassigned occurrences in ({}, {}]", found.len(), window_start, window_end);
        Ok(found)
    }
}
