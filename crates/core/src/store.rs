//! Storage traits the scheduler and API are written against.
//!
//! `tutorsync-db` provides a PostgreSQL implementation and an in-memory one for tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use eyre::Result;
use uuid::Uuid;

use crate::models::{
    notification::NotificationRecord,
    relationship::{ActiveTemplate, Contact, Relationship},
    schedule::ScheduleOccurrence,
    time_slot::TimeSlotTemplate,
};

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Active templates whose relationship is currently teaching.
    async fn active_templates(&self) -> Result<Vec<ActiveTemplate>>;

    async fn get_template(&self, id: Uuid) -> Result<Option<TimeSlotTemplate>>;

    /// Active templates on `weekday` for every non-ended relationship of `tutor_id`.
    async fn tutor_templates_on(&self, tutor_id: Uuid, weekday: Weekday) -> Result<Vec<TimeSlotTemplate>>;

    async fn insert_template(&self, template: &TimeSlotTemplate) -> Result<TimeSlotTemplate>;

    async fn update_template(&self, template: &TimeSlotTemplate) -> Result<TimeSlotTemplate>;

    async fn deactivate_template(&self, id: Uuid, now: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait OccurrenceStore: Send + Sync {
    async fn occurrence_exists(
        &self,
        relationship_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<bool>;

    async fn get_occurrence(&self, id: Uuid) -> Result<Option<ScheduleOccurrence>>;

    /// Non-hidden occurrences on `date` of any relationship involving the tutor or the student.
    async fn participant_occurrences_on(
        &self,
        tutor_id: Uuid,
        student_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleOccurrence>>;

    /// Inserts the batch, ignoring rows that collide with an existing
    /// (relationship, date, start time). Returns the number of rows written.
    async fn insert_occurrences(&self, occurrences: &[ScheduleOccurrence]) -> Result<u64>;

    /// Non-hidden teaching occurrences with `window_start < date <= window_end` whose
    /// relationship is teaching and which miss an exercise or exercise type.
    async fn unassigned_occurrences(
        &self,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Vec<ScheduleOccurrence>>;

    /// Non-hidden, non-completed occurrences of a template dated on or after `from`.
    async fn template_occurrences_from(
        &self,
        template_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<ScheduleOccurrence>>;

    async fn reschedule_occurrence(&self, id: Uuid, start_time: NaiveTime, end_time: NaiveTime) -> Result<()>;

    async fn hide_occurrences(&self, ids: &[Uuid]) -> Result<u64>;

    async fn assign_exercise(
        &self,
        id: Uuid,
        exercise_id: Option<Uuid>,
        exercise_type_id: Option<Uuid>,
    ) -> Result<Option<ScheduleOccurrence>>;

    /// Moves non-hidden teaching occurrences dated before `date` to completed.
    async fn complete_occurrences_before(&self, date: NaiveDate) -> Result<u64>;
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn relationship(&self, id: Uuid) -> Result<Option<Relationship>>;

    async fn contact(&self, user_id: Uuid) -> Result<Option<Contact>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persists the record. When it carries a dedup key that already exists the record is
    /// not written and `None` is returned.
    async fn insert_notification(&self, record: &NotificationRecord) -> Result<Option<NotificationRecord>>;

    async fn notifications_for(&self, receiver_id: Uuid, unread_only: bool) -> Result<Vec<NotificationRecord>>;
}

#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Claims `name` for `holder` until `now + ttl` when it is free, expired, or already
    /// held by `holder`.
    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool>;

    async fn release_lease(&self, name: &str, holder: &str) -> Result<()>;
}

/// Everything the service needs from persistence.
pub trait SchedulingStore:
    TemplateStore + OccurrenceStore + Directory + NotificationStore + LeaseStore
{
}

impl<T> SchedulingStore for T where
    T: TemplateStore + OccurrenceStore + Directory + NotificationStore + LeaseStore
{
}
