use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ScheduleError;
use crate::models::time_slot::TimeSlotTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Pending,
    Teaching,
    Paused,
    Ended,
}

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Teaching => "teaching",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipStatus {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "teaching" => Ok(Self::Teaching),
            "paused" => Ok(Self::Paused),
            "ended" => Ok(Self::Ended),
            other => Err(ScheduleError::Validation(format!(
                "Unknown relationship status: {}",
                other
            ))),
        }
    }
}

/// A tutor–student pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub status: RelationshipStatus,
}

impl Relationship {
    pub fn is_teaching(&self) -> bool {
        self.status == RelationshipStatus::Teaching
    }
}

/// Contact details used when notifying a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub user_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A template together with the relationship that owns it.
#[derive(Debug, Clone)]
pub struct ActiveTemplate {
    pub template: TimeSlotTemplate,
    pub relationship: Relationship,
}
