//! Overlap checks between a template and the sessions its participants already have.

use chrono::{NaiveDate, Weekday};
use serde::Serialize;
use uuid::Uuid;

use tutorsync_core::{
    errors::{ScheduleError, ScheduleResult},
    models::{schedule::ScheduleOccurrence, time_slot::TimeSlotTemplate},
    overlap::{first_overlap, TimeRange},
    store::TemplateStore,
};

/// A template date that could not be materialized because it collides with another session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotConflict {
    pub template_id: Uuid,
    pub relationship_id: Uuid,
    pub date: NaiveDate,
    pub requested: TimeRange,
    pub existing_occurrence_id: Uuid,
    pub existing: TimeRange,
}

/// Finds the first session in `existing` that overlaps `template` on `date`.
///
/// Occurrences produced by the same template never count against it.
pub fn find_conflict(
    template: &TimeSlotTemplate,
    date: NaiveDate,
    existing: &[ScheduleOccurrence],
) -> Option<SlotConflict> {
    let requested = template.time_range();
    existing
        .iter()
        .filter(|o| o.template_id != Some(template.id) && !o.is_hidden)
        .find(|o| requested.overlaps(&o.time_range()))
        .map(|o| SlotConflict {
            template_id: template.id,
            relationship_id: template.relationship_id,
            date,
            requested,
            existing_occurrence_id: o.id,
            existing: o.time_range(),
        })
}

/// Rejects a slot that overlaps another active template of the same tutor on that weekday.
pub async fn ensure_tutor_slot_free<S: TemplateStore + ?Sized>(
    store: &S,
    tutor_id: Uuid,
    weekday: Weekday,
    candidate: TimeRange,
    exclude_template: Option<Uuid>,
) -> ScheduleResult<()> {
    let existing = store.tutor_templates_on(tutor_id, weekday).await?;
    let ranges = existing
        .iter()
        .filter(|t| Some(t.id) != exclude_template)
        .map(TimeSlotTemplate::time_range);

    match first_overlap(candidate, ranges) {
        Some(clash) => Err(ScheduleError::Conflict(format!(
            "{}-{} overlaps an existing slot {}-{} on {}",
            candidate.start.format("%H:%M"),
            candidate.end.format("%H:%M"),
            clash.start.format("%H:%M"),
            clash.end.format("%H:%M"),
            weekday
        ))),
        None => Ok(()),
    }
}
