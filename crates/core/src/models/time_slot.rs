use chrono::{DateTime, Duration, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ScheduleError, ScheduleResult};
use crate::overlap::TimeRange;

/// Minimum length of a tutoring session unless configured otherwise.
pub const DEFAULT_MIN_SESSION_MINUTES: i64 = 30;

/// A recurring weekly session definition owned by a tutor–student relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotTemplate {
    pub id: Uuid,
    pub relationship_id: Uuid,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeSlotTemplate {
    pub fn new(
        relationship_id: Uuid,
        weekday: Weekday,
        start_time: NaiveTime,
        end_time: NaiveTime,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            relationship_id,
            weekday,
            start_time,
            end_time,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    pub fn validate(&self, min_session: Duration) -> ScheduleResult<()> {
        validate_slot(self.start_time, self.end_time, min_session)
    }
}

/// Checks that `start < end` and that the slot lasts at least `min_session`.
pub fn validate_slot(start: NaiveTime, end: NaiveTime, min_session: Duration) -> ScheduleResult<()> {
    if start >= end {
        return Err(ScheduleError::Validation(format!(
            "Start time {} must be before end time {}",
            start.format("%H:%M"),
            end.format("%H:%M")
        )));
    }

    if end - start < min_session {
        return Err(ScheduleError::Validation(format!(
            "Session must last at least {} minutes",
            min_session.num_minutes()
        )));
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub relationship_id: Uuid,
    /// 0 = Sunday
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTemplateRequest {
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateResponse {
    pub id: Uuid,
    pub relationship_id: Uuid,
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub updated_at: DateTime<Utc>,
}

impl From<TimeSlotTemplate> for TemplateResponse {
    fn from(template: TimeSlotTemplate) -> Self {
        Self {
            id: template.id,
            relationship_id: template.relationship_id,
            weekday: crate::recurrence::weekday_index(template.weekday),
            start_time: template.start_time,
            end_time: template.end_time,
            updated_at: template.updated_at,
        }
    }
}
