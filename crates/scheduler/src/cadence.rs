//! Fire times for recurring jobs: a six-field cron expression (seconds first, the format
//! tokio-cron-scheduler takes) evaluated in the configured time zone, plus a random delay so
//! several instances do not hit the database together.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use eyre::{eyre, Result};
use rand::Rng;

#[derive(Debug, Clone)]
pub struct RecurringSchedule {
    expression: String,
    schedule: Schedule,
    pub jitter: Duration,
    pub timezone: Tz,
}

impl RecurringSchedule {
    /// Parses `expression`, e.g. `"0 5 0 * * *"` for 00:05 local time every day.
    pub fn parse(expression: &str, timezone: Tz) -> Result<Self> {
        let expression = expression.trim();
        let schedule = Schedule::from_str(expression)
            .map_err(|e| eyre!("Invalid cron expression '{}': {}", expression, e))?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
            jitter: Duration::zero(),
            timezone,
        })
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter.max(Duration::zero());
        self
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The next fire time strictly after `now`, including jitter. `None` once the
    /// expression has no future matches.
    pub fn next_run_after<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> Option<DateTime<Utc>> {
        let slot = self.next_slot_after(now)?;
        Some(slot.checked_add_signed(self.sample_jitter(rng)).unwrap_or(slot))
    }

    /// The next fire time strictly after `now`, without jitter.
    pub fn next_slot_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&now.with_timezone(&self.timezone))
            .next()
            .map(|at| at.with_timezone(&Utc))
    }

    fn sample_jitter<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let max = self.jitter.num_milliseconds();
        if max <= 0 {
            return Duration::zero();
        }
        Duration::milliseconds(rng.gen_range(0..=max))
    }
}
