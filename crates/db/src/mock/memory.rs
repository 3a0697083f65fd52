//! In-memory store with the same semantics as [`crate::PgStore`], for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use eyre::{eyre, Result};
use tokio::sync::RwLock;
use tutorsync_core::{
    models::{
        notification::NotificationRecord,
        relationship::{ActiveTemplate, Contact, Relationship, RelationshipStatus},
        schedule::{OccurrenceStatus, ScheduleOccurrence},
        time_slot::TimeSlotTemplate,
    },
    store::{Directory, LeaseStore, NotificationStore, OccurrenceStore, TemplateStore},
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    relationships: HashMap<Uuid, Relationship>,
    contacts: HashMap<Uuid, Contact>,
    templates: HashMap<Uuid, TimeSlotTemplate>,
    occurrences: Vec<ScheduleOccurrence>,
    notifications: Vec<NotificationRecord>,
    leases: HashMap<String, (String, DateTime<Utc>)>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_relationship(&self, relationship: Relationship) {
        self.state
            .write()
            .await
            .relationships
            .insert(relationship.id, relationship);
    }

    pub async fn set_relationship_status(&self, id: Uuid, status: RelationshipStatus) {
        if let Some(relationship) = self.state.write().await.relationships.get_mut(&id) {
            relationship.status = status;
        }
    }

    pub async fn add_contact(&self, contact: Contact) {
        self.state.write().await.contacts.insert(contact.user_id, contact);
    }

    pub async fn add_template(&self, template: TimeSlotTemplate) {
        self.state.write().await.templates.insert(template.id, template);
    }

    pub async fn add_occurrence(&self, occurrence: ScheduleOccurrence) {
        self.state.write().await.occurrences.push(occurrence);
    }

    pub async fn occurrences(&self) -> Vec<ScheduleOccurrence> {
        let mut occurrences = self.state.read().await.occurrences.clone();
        occurrences.sort_by_key(|o| (o.date, o.start_time));
        occurrences
    }

    pub async fn notifications(&self) -> Vec<NotificationRecord> {
        self.state.read().await.notifications.clone()
    }

    pub async fn lease_holder(&self, name: &str) -> Option<String> {
        self.state
            .read()
            .await
            .leases
            .get(name)
            .map(|(holder, _)| holder.clone())
    }
}

impl MemoryState {
    fn is_not_ended(&self, relationship_id: Uuid) -> bool {
        self.relationships
            .get(&relationship_id)
            .map(|r| r.status != RelationshipStatus::Ended)
            .unwrap_or(false)
    }

    fn is_teaching(&self, relationship_id: Uuid) -> bool {
        self.relationships
            .get(&relationship_id)
            .map(Relationship::is_teaching)
            .unwrap_or(false)
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn active_templates(&self) -> Result<Vec<ActiveTemplate>> {
        let state = self.state.read().await;
        let mut templates: Vec<ActiveTemplate> = state
            .templates
            .values()
            .filter(|t| t.is_active)
            .filter_map(|t| {
                state
                    .relationships
                    .get(&t.relationship_id)
                    .filter(|r| r.is_teaching())
                    .map(|r| ActiveTemplate {
                        template: t.clone(),
                        relationship: r.clone(),
                    })
            })
            .collect();
        templates.sort_by_key(|a| a.template.created_at);
        Ok(templates)
    }

    async fn get_template(&self, id: Uuid) -> Result<Option<TimeSlotTemplate>> {
        Ok(self.state.read().await.templates.get(&id).cloned())
    }

    async fn tutor_templates_on(&self, tutor_id: Uuid, weekday: Weekday) -> Result<Vec<TimeSlotTemplate>> {
        let state = self.state.read().await;
        let mut templates: Vec<TimeSlotTemplate> = state
            .templates
            .values()
            .filter(|t| t.is_active && t.weekday == weekday && state.is_not_ended(t.relationship_id))
            .filter(|t| {
                state
                    .relationships
                    .get(&t.relationship_id)
                    .map(|r| r.tutor_id == tutor_id)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        templates.sort_by_key(|t| t.start_time);
        Ok(templates)
    }

    async fn insert_template(&self, template: &TimeSlotTemplate) -> Result<TimeSlotTemplate> {
        let mut state = self.state.write().await;
        if !state.relationships.contains_key(&template.relationship_id) {
            return Err(eyre!("Relationship {} does not exist", template.relationship_id));
        }
        state.templates.insert(template.id, template.clone());
        Ok(template.clone())
    }

    async fn update_template(&self, template: &TimeSlotTemplate) -> Result<TimeSlotTemplate> {
        let mut state = self.state.write().await;
        let stored = state
            .templates
            .get_mut(&template.id)
            .ok_or_else(|| eyre!("Template {} does not exist", template.id))?;
        stored.weekday = template.weekday;
        stored.start_time = template.start_time;
        stored.end_time = template.end_time;
        stored.is_active = template.is_active;
        stored.updated_at = template.updated_at;
        Ok(stored.clone())
    }

    async fn deactivate_template(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        if let Some(template) = self.state.write().await.templates.get_mut(&id) {
            template.is_active = false;
            template.updated_at = now;
        }
        Ok(())
    }
}

/// Mirrors the partial unique index: only visible rows occupy a slot.
fn holds_slot(o: &ScheduleOccurrence, relationship_id: Uuid, date: NaiveDate, start_time: NaiveTime) -> bool {
    !o.is_hidden && o.relationship_id == relationship_id && o.date == date && o.start_time == start_time
}

#[async_trait]
impl OccurrenceStore for MemoryStore {
    async fn occurrence_exists(
        &self,
        relationship_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .occurrences
            .iter()
            .any(|o| holds_slot(o, relationship_id, date, start_time)))
    }

    async fn get_occurrence(&self, id: Uuid) -> Result<Option<ScheduleOccurrence>> {
        Ok(self
            .state
            .read()
            .await
            .occurrences
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn participant_occurrences_on(
        &self,
        tutor_id: Uuid,
        student_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleOccurrence>> {
        let state = self.state.read().await;
        Ok(state
            .occurrences
            .iter()
            .filter(|o| o.date == date && !o.is_hidden)
            .filter(|o| {
                state
                    .relationships
                    .get(&o.relationship_id)
                    .map(|r| r.tutor_id == tutor_id || r.student_id == student_id)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn insert_occurrences(&self, occurrences: &[ScheduleOccurrence]) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut inserted = 0;
        for occurrence in occurrences {
            let duplicate = !occurrence.is_hidden
                && state.occurrences.iter().any(|o| {
                    holds_slot(o, occurrence.relationship_id, occurrence.date, occurrence.start_time)
                });
            if !duplicate {
                state.occurrences.push(occurrence.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn unassigned_occurrences(
        &self,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Vec<ScheduleOccurrence>> {
        let state = self.state.read().await;
        let mut occurrences: Vec<ScheduleOccurrence> = state
            .occurrences
            .iter()
            .filter(|o| o.date > window_start && o.date <= window_end)
            .filter(|o| !o.is_hidden && o.status == OccurrenceStatus::Teaching)
            .filter(|o| o.is_unassigned())
            .filter(|o| state.is_teaching(o.relationship_id))
            .cloned()
            .collect();
        occurrences.sort_by_key(|o| (o.date, o.start_time));
        Ok(occurrences)
    }

    async fn template_occurrences_from(
        &self,
        template_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<ScheduleOccurrence>> {
        Ok(self
            .state
            .read()
            .await
            .occurrences
            .iter()
            .filter(|o| o.template_id == Some(template_id) && o.date >= from)
            .filter(|o| !o.is_hidden && o.status != OccurrenceStatus::Completed)
            .cloned()
            .collect())
    }

    async fn reschedule_occurrence(&self, id: Uuid, start_time: NaiveTime, end_time: NaiveTime) -> Result<()> {
        if let Some(occurrence) = self
            .state
            .write()
            .await
            .occurrences
            .iter_mut()
            .find(|o| o.id == id)
        {
            occurrence.start_time = start_time;
            occurrence.end_time = end_time;
        }
        Ok(())
    }

    async fn hide_occurrences(&self, ids: &[Uuid]) -> Result<u64> {
        let mut hidden = 0;
        for occurrence in self.state.write().await.occurrences.iter_mut() {
            if ids.contains(&occurrence.id) && !occurrence.is_hidden {
                occurrence.is_hidden = true;
                hidden += 1;
            }
        }
        Ok(hidden)
    }

    async fn assign_exercise(
        &self,
        id: Uuid,
        exercise_id: Option<Uuid>,
        exercise_type_id: Option<Uuid>,
    ) -> Result<Option<ScheduleOccurrence>> {
        let mut state = self.state.write().await;
        Ok(state.occurrences.iter_mut().find(|o| o.id == id).map(|o| {
            o.exercise_id = exercise_id;
            o.exercise_type_id = exercise_type_id;
            o.clone()
        }))
    }

    async fn complete_occurrences_before(&self, date: NaiveDate) -> Result<u64> {
        let mut completed = 0;
        for occurrence in self.state.write().await.occurrences.iter_mut() {
            if occurrence.date < date
                && occurrence.status == OccurrenceStatus::Teaching
                && !occurrence.is_hidden
            {
                occurrence.status = OccurrenceStatus::Completed;
                completed += 1;
            }
        }
        Ok(completed)
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn relationship(&self, id: Uuid) -> Result<Option<Relationship>> {
        Ok(self.state.read().await.relationships.get(&id).cloned())
    }

    async fn contact(&self, user_id: Uuid) -> Result<Option<Contact>> {
        Ok(self.state.read().await.contacts.get(&user_id).cloned())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, record: &NotificationRecord) -> Result<Option<NotificationRecord>> {
        let mut state = self.state.write().await;
        if let Some(key) = &record.dedup_key {
            if state
                .notifications
                .iter()
                .any(|n| n.dedup_key.as_ref() == Some(key))
            {
                return Ok(None);
            }
        }
        state.notifications.push(record.clone());
        Ok(Some(record.clone()))
    }

    async fn notifications_for(&self, receiver_id: Uuid, unread_only: bool) -> Result<Vec<NotificationRecord>> {
        let mut notifications: Vec<NotificationRecord> = self
            .state
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| n.receiver_id == receiver_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }
}

#[async_trait]
impl LeaseStore for MemoryStore {
    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let available = match state.leases.get(name) {
            Some((current, expires_at)) => current == holder || *expires_at <= now,
            None => true,
        };
        if available {
            state
                .leases
                .insert(name.to_string(), (holder.to_string(), now + ttl));
        }
        Ok(available)
    }

    async fn release_lease(&self, name: &str, holder: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if state.leases.get(name).map(|(h, _)| h == holder).unwrap_or(false) {
            state.leases.remove(name);
        }
        Ok(())
    }
}
