//! The reminder cycle: scan for unassigned sessions and notify each tutor.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use eyre::{eyre, Result};
use serde::Serialize;
use tracing::{error, info};

use tutorsync_core::{
    errors::{ScheduleError, ScheduleResult},
    models::schedule::ScheduleOccurrence,
    recurrence::days_after,
    store::{Directory, SchedulingStore},
};

use crate::clock::Clock;
use crate::notifier::{Notifier, NotifyOutcome};
use crate::runner::ScheduledJob;
use crate::scanner::GapScanner;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub scanned: usize,
    pub notified: usize,
    pub duplicates: usize,
    pub failed: usize,
}

pub struct ReminderJob {
    scanner: GapScanner,
    store: Arc<dyn SchedulingStore>,
    notifier: Arc<Notifier>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    lookahead_days: i64,
}

impl ReminderJob {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        notifier: Arc<Notifier>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
        lookahead_days: i64,
    ) -> Self {
        Self {
            scanner: GapScanner::new(Arc::clone(&store)),
            store,
            notifier,
            clock,
            timezone,
            lookahead_days,
        }
    }

    /// Reminds about every unassigned session in `(today, today + lookahead]`. A failure
    /// for one session is logged and does not stop the others.
    pub async fn run_cycle(&self) -> ScheduleResult<ReminderReport> {
        let today = self.clock.today_in(self.timezone);
        let window_end = days_after(today, self.lookahead_days).ok_or_else(|| {
            ScheduleError::Validation(format!("Invalid lookahead of {} days", self.lookahead_days))
        })?;
        let gaps = self.scanner.scan(today, window_end).await?;

        let mut report = ReminderReport {
            scanned: gaps.len(),
            ..Default::default()
        };
        for occurrence in &gaps {
            match self.remind(occurrence, today).await {
                Ok(outcome) if outcome.is_duplicate() => report.duplicates += 1,
                Ok(_) => report.notified += 1,
                Err(e) => {
                    error!("Failed to remind about occurrence {}: {:?}", occurrence.id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Reminder cycle for {}: {} unassigned, {} notified, {} already reminded, {} failed",
            today, report.scanned, report.notified, report.duplicates, report.failed
        );
        Ok(report)
    }

    async fn remind(&self, occurrence: &ScheduleOccurrence, cycle: NaiveDate) -> Result<NotifyOutcome> {
        let relationship = self
            .store
            .relationship(occurrence.relationship_id)
            .await?
            .ok_or_else(|| eyre!("Relationship {} not found", occurrence.relationship_id))?;
        let tutor = self
            .store
            .contact(relationship.tutor_id)
            .await?
            .ok_or_else(|| eyre!("Tutor {} has no contact details", relationship.tutor_id))?;

        self.notifier.notify_unassigned(occurrence, &tutor, cycle).await
    }
}

#[async_trait]
impl ScheduledJob for ReminderJob {
    fn name(&self) -> &'static str {
        "exercise_reminders"
    }

    async fn run(&self) -> Result<()> {
        self.run_cycle().await?;
        Ok(())
    }
}
