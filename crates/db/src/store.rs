//! PostgreSQL implementation of the core store traits.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use eyre::Result;
use tutorsync_core::{
    models::{
        notification::NotificationRecord,
        relationship::{ActiveTemplate, Contact, Relationship},
        schedule::ScheduleOccurrence,
        time_slot::TimeSlotTemplate,
    },
    recurrence::weekday_index,
    store::{Directory, LeaseStore, NotificationStore, OccurrenceStore, TemplateStore},
};
use uuid::Uuid;

use crate::repositories::{lease, notification, relationship, schedule, time_slot};
use crate::DbPool;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = eyre::Report>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl TemplateStore for PgStore {
    async fn active_templates(&self) -> Result<Vec<ActiveTemplate>> {
        let rows = time_slot::get_active_templates_for_teaching(&self.pool).await?;
        convert_all(rows)
    }

    async fn get_template(&self, id: Uuid) -> Result<Option<TimeSlotTemplate>> {
        time_slot::get_template_by_id(&self.pool, id)
            .await?
            .map(TimeSlotTemplate::try_from)
            .transpose()
    }

    async fn tutor_templates_on(&self, tutor_id: Uuid, weekday: Weekday) -> Result<Vec<TimeSlotTemplate>> {
        let rows = time_slot::get_tutor_templates_on(&self.pool, tutor_id, weekday_index(weekday)).await?;
        convert_all(rows)
    }

    async fn insert_template(&self, template: &TimeSlotTemplate) -> Result<TimeSlotTemplate> {
        time_slot::create_template(&self.pool, template).await?.try_into()
    }

    async fn update_template(&self, template: &TimeSlotTemplate) -> Result<TimeSlotTemplate> {
        time_slot::update_template(&self.pool, template).await?.try_into()
    }

    async fn deactivate_template(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        time_slot::deactivate_template(&self.pool, id, now).await
    }
}

#[async_trait]
impl OccurrenceStore for PgStore {
    async fn occurrence_exists(
        &self,
        relationship_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<bool> {
        schedule::occurrence_exists(&self.pool, relationship_id, date, start_time).await
    }

    async fn get_occurrence(&self, id: Uuid) -> Result<Option<ScheduleOccurrence>> {
        schedule::get_occurrence_by_id(&self.pool, id)
            .await?
            .map(ScheduleOccurrence::try_from)
            .transpose()
    }

    async fn participant_occurrences_on(
        &self,
        tutor_id: Uuid,
        student_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleOccurrence>> {
        let rows = schedule::get_participant_occurrences_on(&self.pool, tutor_id, student_id, date).await?;
        convert_all(rows)
    }

    async fn insert_occurrences(&self, occurrences: &[ScheduleOccurrence]) -> Result<u64> {
        if occurrences.is_empty() {
            return Ok(0);
        }
        schedule::insert_occurrences(&self.pool, occurrences).await
    }

    async fn unassigned_occurrences(
        &self,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Vec<ScheduleOccurrence>> {
        let rows = schedule::get_unassigned_occurrences(&self.pool, window_start, window_end).await?;
        convert_all(rows)
    }

    async fn template_occurrences_from(
        &self,
        template_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<ScheduleOccurrence>> {
        let rows = schedule::get_template_occurrences_from(&self.pool, template_id, from).await?;
        convert_all(rows)
    }

    async fn reschedule_occurrence(&self, id: Uuid, start_time: NaiveTime, end_time: NaiveTime) -> Result<()> {
        schedule::reschedule_occurrence(&self.pool, id, start_time, end_time).await
    }

    async fn hide_occurrences(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        schedule::hide_occurrences(&self.pool, ids).await
    }

    async fn assign_exercise(
        &self,
        id: Uuid,
        exercise_id: Option<Uuid>,
        exercise_type_id: Option<Uuid>,
    ) -> Result<Option<ScheduleOccurrence>> {
        schedule::assign_exercise(&self.pool, id, exercise_id, exercise_type_id)
            .await?
            .map(ScheduleOccurrence::try_from)
            .transpose()
    }

    async fn complete_occurrences_before(&self, date: NaiveDate) -> Result<u64> {
        schedule::complete_occurrences_before(&self.pool, date).await
    }
}

#[async_trait]
impl Directory for PgStore {
    async fn relationship(&self, id: Uuid) -> Result<Option<Relationship>> {
        relationship::get_relationship_by_id(&self.pool, id)
            .await?
            .map(Relationship::try_from)
            .transpose()
    }

    async fn contact(&self, user_id: Uuid) -> Result<Option<Contact>> {
        Ok(relationship::get_user_by_id(&self.pool, user_id)
            .await?
            .map(Contact::from))
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, record: &NotificationRecord) -> Result<Option<NotificationRecord>> {
        Ok(notification::create_notification(&self.pool, record)
            .await?
            .map(NotificationRecord::from))
    }

    async fn notifications_for(&self, receiver_id: Uuid, unread_only: bool) -> Result<Vec<NotificationRecord>> {
        Ok(notification::get_notifications_for_receiver(&self.pool, receiver_id, unread_only)
            .await?
            .into_iter()
            .map(NotificationRecord::from)
            .collect())
    }
}

#[async_trait]
impl LeaseStore for PgStore {
    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool> {
        lease::try_acquire_lease(&self.pool, name, holder, now, now + ttl).await
    }

    async fn release_lease(&self, name: &str, holder: &str) -> Result<()> {
        lease::release_lease(&self.pool, name, holder).await
    }
}
