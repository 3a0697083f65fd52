use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use eyre::{eyre, Report, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tutorsync_core::{
    models::{
        notification::NotificationRecord,
        relationship::{ActiveTemplate, Contact, Relationship},
        schedule::ScheduleOccurrence,
        time_slot::TimeSlotTemplate,
    },
    recurrence::weekday_from_index,
};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTimeSlotTemplate {
    pub id: Uuid,
    pub relationship_id: Uuid,
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Template row joined with its owning relationship.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbActiveTemplate {
    pub id: Uuid,
    pub relationship_id: Uuid,
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbOccurrence {
    pub id: Uuid,
    pub relationship_id: Uuid,
    pub template_id: Option<Uuid>,
    pub occurrence_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub exercise_id: Option<Uuid>,
    pub exercise_type_id: Option<Uuid>,
    pub is_hidden: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbRelationship {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbNotification {
    pub id: Uuid,
    pub receiver_id: Uuid,
    pub message: String,
    pub url: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub dedup_key: Option<String>,
}

impl TryFrom<DbTimeSlotTemplate> for TimeSlotTemplate {
    type Error = Report;

    fn try_from(row: DbTimeSlotTemplate) -> Result<Self> {
        let weekday = weekday_from_index(row.weekday)
            .ok_or_else(|| eyre!("Template {} has invalid weekday {}", row.id, row.weekday))?;

        Ok(TimeSlotTemplate {
            id: row.id,
            relationship_id: row.relationship_id,
            weekday,
            start_time: row.start_time,
            end_time: row.end_time,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbActiveTemplate> for ActiveTemplate {
    type Error = Report;

    fn try_from(row: DbActiveTemplate) -> Result<Self> {
        let relationship = Relationship {
            id: row.relationship_id,
            tutor_id: row.tutor_id,
            student_id: row.student_id,
            status: row.status.parse()?,
        };
        let template = TimeSlotTemplate::try_from(DbTimeSlotTemplate {
            id: row.id,
            relationship_id: row.relationship_id,
            weekday: row.weekday,
            start_time: row.start_time,
            end_time: row.end_time,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })?;

        Ok(ActiveTemplate {
            template,
            relationship,
        })
    }
}

impl TryFrom<DbOccurrence> for ScheduleOccurrence {
    type Error = Report;

    fn try_from(row: DbOccurrence) -> Result<Self> {
        Ok(ScheduleOccurrence {
            id: row.id,
            relationship_id: row.relationship_id,
            template_id: row.template_id,
            date: row.occurrence_date,
            start_time: row.start_time,
            end_time: row.end_time,
            exercise_id: row.exercise_id,
            exercise_type_id: row.exercise_type_id,
            is_hidden: row.is_hidden,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<DbRelationship> for Relationship {
    type Error = Report;

    fn try_from(row: DbRelationship) -> Result<Self> {
        Ok(Relationship {
            id: row.id,
            tutor_id: row.tutor_id,
            student_id: row.student_id,
            status: row.status.parse()?,
        })
    }
}

impl From<DbUser> for Contact {
    fn from(row: DbUser) -> Self {
        Contact {
            user_id: row.id,
            display_name: row.display_name,
            email: row.email,
            phone: row.phone,
        }
    }
}

impl From<DbNotification> for NotificationRecord {
    fn from(row: DbNotification) -> Self {
        NotificationRecord {
            id: row.id,
            receiver_id: row.receiver_id,
            message: row.message,
            url: row.url,
            is_read: row.is_read,
            created_at: row.created_at,
            dedup_key: row.dedup_key,
        }
    }
}
