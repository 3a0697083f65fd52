//! Creating, editing and removing weekly templates.

use std::sync::Arc;

use chrono::{Duration, Weekday};
use chrono_tz::Tz;
use tracing::info;
use uuid::Uuid;

use tutorsync_core::{
    errors::{ScheduleError, ScheduleResult},
    models::{
        relationship::{Relationship, RelationshipStatus},
        time_slot::{validate_slot, CreateTemplateRequest, TimeSlotTemplate, UpdateTemplateRequest},
    },
    overlap::TimeRange,
    recurrence::weekday_from_index,
    store::{Directory, OccurrenceStore, SchedulingStore, TemplateStore},
};

use crate::clock::Clock;
use crate::config::TemplateEditPolicy;
use crate::conflict::ensure_tutor_slot_free;

pub struct TemplateManager {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    min_session: Duration,
    edit_policy: TemplateEditPolicy,
}

impl TemplateManager {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
        min_session: Duration,
        edit_policy: TemplateEditPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            timezone,
            min_session,
            edit_policy,
        }
    }

    pub async fn create(&self, request: CreateTemplateRequest) -> ScheduleResult<TimeSlotTemplate> {
        let weekday = parse_weekday(request.weekday)?;
        validate_slot(request.start_time, request.end_time, self.min_session)?;

        let relationship = self.open_relationship(request.relationship_id).await?;
        let range = TimeRange::new(request.start_time, request.end_time);
        ensure_tutor_slot_free(&*self.store, relationship.tutor_id, weekday, range, None).await?;

        let template = TimeSlotTemplate::new(
            relationship.id,
            weekday,
            request.start_time,
            request.end_time,
            self.clock.now(),
        );
        let created = self.store.insert_template(&template).await?;

        info!(
            "Created template {} for relationship {} on {} {}-{}",
            created.id, created.relationship_id, created.weekday, created.start_time, created.end_time
        );
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, request: UpdateTemplateRequest) -> ScheduleResult<TimeSlotTemplate> {
        let weekday = parse_weekday(request.weekday)?;
        validate_slot(request.start_time, request.end_time, self.min_session)?;

        let existing = self.active_template(id).await?;
        let relationship = self.open_relationship(existing.relationship_id).await?;
        let range = TimeRange::new(request.start_time, request.end_time);
        ensure_tutor_slot_free(&*self.store, relationship.tutor_id, weekday, range, Some(id)).await?;

        let weekday_changed = existing.weekday != weekday;
        let updated = self
            .store
            .update_template(&TimeSlotTemplate {
                weekday,
                start_time: request.start_time,
                end_time: request.end_time,
                updated_at: self.clock.now(),
                ..existing
            })
            .await?;

        if self.edit_policy == TemplateEditPolicy::UpdateExisting {
            self.apply_to_future_occurrences(&updated, weekday_changed).await?;
        }

        info!("Updated template {} ({})", updated.id, self.edit_policy);
        Ok(updated)
    }

    /// Deactivates the template and hides its upcoming sessions. Returns how many were hidden.
    pub async fn remove(&self, id: Uuid) -> ScheduleResult<u64> {
        let template = self.active_template(id).await?;
        self.store.deactivate_template(template.id, self.clock.now()).await?;

        let today = self.clock.today_in(self.timezone);
        let future: Vec<Uuid> = self
            .store
            .template_occurrences_from(template.id, today)
            .await?
            .into_iter()
            .map(|o| o.id)
            .collect();
        let hidden = self.store.hide_occurrences(&future).await?;

        info!("Removed template {} and hid {} upcoming occurrences", id, hidden);
        Ok(hidden)
    }

    async fn apply_to_future_occurrences(&self, template: &TimeSlotTemplate, weekday_changed: bool) -> ScheduleResult<()> {
        let today = self.clock.today_in(self.timezone);
        let future = self.store.template_occurrences_from(template.id, today).await?;

        if weekday_changed {
            let ids: Vec<Uuid> = future.iter().map(|o| o.id).collect();
            self.store.hide_occurrences(&ids).await?;
        } else {
            for occurrence in &future {
                self.store
                    .reschedule_occurrence(occurrence.id, template.start_time, template.end_time)
                    .await?;
            }
        }
        Ok(())
    }

    async fn active_template(&self, id: Uuid) -> ScheduleResult<TimeSlotTemplate> {
        self.store
            .get_template(id)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| ScheduleError::NotFound(format!("Template {}", id)))
    }

    async fn open_relationship(&self, id: Uuid) -> ScheduleResult<Relationship> {
        let relationship = self
            .store
            .relationship(id)
            .await?
            .ok_or_else(|| ScheduleError::NotFound(format!("Relationship {}", id)))?;

        if relationship.status == RelationshipStatus::Ended {
            return Err(ScheduleError::Validation(format!(
                "Relationship {} has ended",
                id
            )));
        }
        Ok(relationship)
    }
}

fn parse_weekday(index: i16) -> ScheduleResult<Weekday> {
    weekday_from_index(index)
        .ok_or_else(|| ScheduleError::Validation(format!("Weekday must be between 0 and 6, got {}", index)))
}
