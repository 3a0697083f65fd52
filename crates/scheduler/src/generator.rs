//! Materializes active weekly templates into dated occurrences.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use tutorsync_core::{
    errors::{ScheduleError, ScheduleResult},
    models::{relationship::ActiveTemplate, schedule::ScheduleOccurrence},
    recurrence::{dates_on_weekday, days_after},
    store::{OccurrenceStore, SchedulingStore, TemplateStore},
};

use crate::clock::Clock;
use crate::config::{ConflictPolicy, MAX_HORIZON_DAYS};
use crate::conflict::{find_conflict, SlotConflict};
use crate::notifier::Notifier;
use crate::runner::ScheduledJob;

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub timezone: Tz,
    pub horizon_days: i64,
    pub min_session: Duration,
    pub conflict_policy: ConflictPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub created: u64,
    pub skipped_existing: u64,
    pub conflicts: Vec<SlotConflict>,
    pub invalid_templates: Vec<Uuid>,
    /// Past occurrences moved to completed before generating.
    pub completed: u64,
}

pub struct OccurrenceGenerator {
    store: Arc<dyn SchedulingStore>,
    notifier: Arc<Notifier>,
    clock: Arc<dyn Clock>,
    settings: GeneratorSettings,
}

impl OccurrenceGenerator {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        notifier: Arc<Notifier>,
        clock: Arc<dyn Clock>,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            settings,
        }
    }

    /// Creates an occurrence for every active template on every matching date in
    /// `[horizon_start, horizon_end]` that has none yet. Running it again creates nothing.
    /// Horizons longer than [`MAX_HORIZON_DAYS`] are rejected.
    pub async fn generate(&self, horizon_start: NaiveDate, horizon_end: NaiveDate) -> ScheduleResult<GenerationReport> {
        if horizon_end < horizon_start {
            return Err(ScheduleError::Validation(format!(
                "Horizon end {} is before its start {}",
                horizon_end, horizon_start
            )));
        }
        if horizon_end.signed_duration_since(horizon_start).num_days() > MAX_HORIZON_DAYS {
            return Err(ScheduleError::Validation(format!(
                "Horizon {}..={} is longer than {} days",
                horizon_start, horizon_end, MAX_HORIZON_DAYS
            )));
        }

        let templates = self.store.active_templates().await?;
        let mut report = GenerationReport::default();

        for active in &templates {
            let template = &active.template;
            if let Err(e) = template.validate(self.settings.min_session) {
                warn!("Skipping template {}: {}", template.id, e);
                report.invalid_templates.push(template.id);
                continue;
            }

            let mut batch = Vec::new();
            for date in dates_on_weekday(template.weekday, horizon_start, horizon_end) {
                if self
                    .store
                    .occurrence_exists(template.relationship_id, date, template.start_time)
                    .await?
                {
                    report.skipped_existing += 1;
                    continue;
                }

                let existing = self
                    .store
                    .participant_occurrences_on(active.relationship.tutor_id, active.relationship.student_id, date)
                    .await?;
                // Already materialized under the template's previous times.
                if existing.iter().any(|o| o.template_id == Some(template.id)) {
                    report.skipped_existing += 1;
                    continue;
                }
                if let Some(conflict) = find_conflict(template, date, &existing) {
                    self.handle_conflict(active, &conflict).await;
                    report.conflicts.push(conflict);
                    continue;
                }

                batch.push(ScheduleOccurrence::from_template(template, date, self.clock.now()));
            }

            if !batch.is_empty() {
                let created = self.store.insert_occurrences(&batch).await?;
                report.skipped_existing += batch.len() as u64 - created;
                report.created += created;
            }
        }

        info!(
            "Generated {} occurrences from {} templates for {}..={} ({} existing, {} conflicts)",
            report.created,
            templates.len(),
            horizon_start,
            horizon_end,
            report.skipped_existing,
            report.conflicts.len()
        );
        Ok(report)
    }

    /// One scheduled cycle: complete past sessions, then fill the horizon from today.
    pub async fn run_cycle(&self) -> ScheduleResult<GenerationReport> {
        let today = self.clock.today_in(self.settings.timezone);
        let completed = self.store.complete_occurrences_before(today).await?;

        let horizon_end = days_after(today, self.settings.horizon_days).ok_or_else(|| {
            ScheduleError::Validation(format!("Invalid horizon of {} days", self.settings.horizon_days))
        })?;

        let mut report = self.generate(today, horizon_end).await?;
        report.completed = completed;
        Ok(report)
    }

    async fn handle_conflict(&self, active: &ActiveTemplate, conflict: &SlotConflict) {
        warn!(
            "Template {} on {} overlaps occurrence {}",
            conflict.template_id, conflict.date, conflict.existing_occurrence_id
        );

        if self.settings.conflict_policy == ConflictPolicy::FlagAndNotify {
            if let Err(e) = self
                .notifier
                .notify_conflict(active.relationship.tutor_id, conflict)
                .await
            {
                warn!("Failed to notify tutor about conflict: {:?}", e);
            }
        }
    }
}

#[async_trait]
impl ScheduledJob for OccurrenceGenerator {
    fn name(&self) -> &'static str {
        "generate_occurrences"
    }

    async fn run(&self) -> eyre::Result<()> {
        self.run_cycle().await?;
        Ok(())
    }
}
