use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ScheduleError;
use crate::models::time_slot::TimeSlotTemplate;
use crate::overlap::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceStatus {
    Teaching,
    Completed,
}

impl OccurrenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teaching => "teaching",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for OccurrenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OccurrenceStatus {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "teaching" => Ok(Self::Teaching),
            "completed" => Ok(Self::Completed),
            other => Err(ScheduleError::Validation(format!(
                "Unknown occurrence status: {}",
                other
            ))),
        }
    }
}

/// Lifecycle state derived from the status, hidden flag and assignment fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceState {
    Unassigned,
    Assigned,
    Hidden,
    Completed,
}

/// One concrete dated instance of a recurring tutoring session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOccurrence {
    pub id: Uuid,
    pub relationship_id: Uuid,
    pub template_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub exercise_id: Option<Uuid>,
    pub exercise_type_id: Option<Uuid>,
    pub is_hidden: bool,
    pub status: OccurrenceStatus,
    pub created_at: DateTime<Utc>,
}

impl ScheduleOccurrence {
    /// Materializes `template` on `date`.
    pub fn from_template(template: &TimeSlotTemplate, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            relationship_id: template.relationship_id,
            template_id: Some(template.id),
            date,
            start_time: template.start_time,
            end_time: template.end_time,
            exercise_id: None,
            exercise_type_id: None,
            is_hidden: false,
            status: OccurrenceStatus::Teaching,
            created_at: now,
        }
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    /// A session counts as unassigned until both the exercise and its type are set.
    pub fn is_unassigned(&self) -> bool {
        self.exercise_id.is_none() || self.exercise_type_id.is_none()
    }

    pub fn state(&self) -> OccurrenceState {
        if self.is_hidden {
            OccurrenceState::Hidden
        } else if self.status == OccurrenceStatus::Completed {
            OccurrenceState::Completed
        } else if self.is_unassigned() {
            OccurrenceState::Unassigned
        } else {
            OccurrenceState::Assigned
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignExerciseRequest {
    pub exercise_id: Option<Uuid>,
    pub exercise_type_id: Option<Uuid>,
}
