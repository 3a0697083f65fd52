use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of reminders the notifier sends. Part of the dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    UnassignedExercise,
    ScheduleConflict,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnassignedExercise => "unassigned_exercise",
            Self::ScheduleConflict => "schedule_conflict",
        }
    }
}

/// Builds the key that keeps a reminder at-most-once per subject, kind and cycle date.
pub fn reminder_dedup_key(subject_id: Uuid, kind: ReminderKind, cycle: NaiveDate) -> String {
    format!("{}:{}:{}", subject_id, kind.as_str(), cycle.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub receiver_id: Uuid,
    pub message: String,
    pub url: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dedup_key: Option<String>,
}

impl NotificationRecord {
    pub fn new(receiver_id: Uuid, message: String, url: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            receiver_id,
            message,
            url,
            is_read: false,
            created_at: now,
            dedup_key: None,
        }
    }

    pub fn with_dedup_key(mut self, key: String) -> Self {
        self.dedup_key = Some(key);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}
