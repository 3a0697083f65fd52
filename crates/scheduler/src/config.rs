use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use chrono_tz::Tz;
use eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tutorsync_core::models::time_slot::DEFAULT_MIN_SESSION_MINUTES;

use crate::cadence::RecurringSchedule;

/// What the generator does when a template date overlaps an existing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    #[default]
    Skip,
    FlagAndNotify,
}

impl FromStr for ConflictPolicy {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(Self::Skip),
            "flag_and_notify" => Ok(Self::FlagAndNotify),
            other => Err(eyre!("Unknown conflict policy: {}", other)),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => f.write_str("skip"),
            Self::FlagAndNotify => f.write_str("flag_and_notify"),
        }
    }
}

/// How a template edit affects occurrences that were already materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateEditPolicy {
    /// Existing occurrences keep their times; only later generation uses the new slot.
    #[default]
    RegenerateFutureOnly,
    /// Future occurrences move to the new times, or are hidden when the weekday changes.
    UpdateExisting,
}

impl FromStr for TemplateEditPolicy {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "regenerate_future_only" => Ok(Self::RegenerateFutureOnly),
            "update_existing" => Ok(Self::UpdateExisting),
            other => Err(eyre!("Unknown template edit policy: {}", other)),
        }
    }
}

impl fmt::Display for TemplateEditPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegenerateFutureOnly => f.write_str("regenerate_future_only"),
            Self::UpdateExisting => f.write_str("update_existing"),
        }
    }
}

/// Longest span a generation run may cover.
pub const MAX_HORIZON_DAYS: i64 = 366;
pub const MAX_LOOKAHEAD_DAYS: i64 = 31;
const MAX_JITTER_SECONDS: i64 = 3_600;
const MAX_LEASE_TTL_SECONDS: i64 = 86_400;
const MAX_MIN_SESSION_MINUTES: i64 = 24 * 60;

/// When a job fires: a six-field cron expression with seconds first, in the scheduler's
/// time zone.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    pub cron: String,
}

impl TaskConfig {
    pub fn new(cron: impl Into<String>) -> Self {
        Self { cron: cron.into() }
    }

    pub fn schedule(&self, timezone: Tz, jitter: Duration) -> Result<RecurringSchedule> {
        Ok(RecurringSchedule::parse(&self.cron, timezone)?.with_jitter(jitter))
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub timezone: Tz,
    pub generation: TaskConfig,
    pub horizon_days: i64,
    pub reminders: TaskConfig,
    pub lookahead_days: i64,
    pub jitter: Duration,
    pub min_session: Duration,
    pub conflict_policy: ConflictPolicy,
    pub template_edit_policy: TemplateEditPolicy,
    pub email_template_dir: PathBuf,
    pub strings_file: Option<PathBuf>,
    pub web_base_url: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub email_queue_capacity: usize,
    pub lease_ttl: Duration,
    pub instance_id: String,
    pub run_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            generation: TaskConfig::new(DEFAULT_GENERATION_CRON),
            horizon_days: 14,
            reminders: TaskConfig::new(DEFAULT_REMINDER_CRON),
            lookahead_days: 1,
            jitter: Duration::zero(),
            min_session: Duration::minutes(DEFAULT_MIN_SESSION_MINUTES),
            conflict_policy: ConflictPolicy::default(),
            template_edit_policy: TemplateEditPolicy::default(),
            email_template_dir: PathBuf::from("templates/email"),
            strings_file: None,
            web_base_url: "http://localhost:3000".to_string(),
            contact_email: "support@tutorsync.local".to_string(),
            contact_phone: None,
            email_queue_capacity: 256,
            lease_ttl: Duration::minutes(10),
            instance_id: format!("tutorsync-{}", Uuid::new_v4()),
            run_on_startup: true,
        }
    }
}

/// 00:05 every day.
pub const DEFAULT_GENERATION_CRON: &str = "0 5 0 * * *";
/// 08:00 every day.
pub const DEFAULT_REMINDER_CRON: &str = "0 0 8 * * *";

impl SchedulerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let timezone = match env::var("SCHEDULER_TIMEZONE") {
            Ok(value) => value
                .parse::<Tz>()
                .map_err(|e| eyre!("Invalid SCHEDULER_TIMEZONE {}: {}", value, e))?,
            Err(_) => defaults.timezone,
        };

        let conflict_policy = match env::var("CONFLICT_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.conflict_policy,
        };
        let template_edit_policy = match env::var("TEMPLATE_EDIT_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.template_edit_policy,
        };

        let config = Self {
            timezone,
            generation: TaskConfig::new(env::var("GENERATION_CRON").unwrap_or(defaults.generation.cron)),
            horizon_days: parse_bounded("GENERATION_HORIZON_DAYS", defaults.horizon_days, 0, MAX_HORIZON_DAYS)?,
            reminders: TaskConfig::new(env::var("REMINDER_CRON").unwrap_or(defaults.reminders.cron)),
            lookahead_days: parse_bounded(
                "REMINDER_LOOKAHEAD_DAYS",
                defaults.lookahead_days,
                1,
                MAX_LOOKAHEAD_DAYS,
            )?,
            jitter: Duration::seconds(parse_bounded("SCHEDULER_JITTER_SECONDS", 0, 0, MAX_JITTER_SECONDS)?),
            min_session: Duration::minutes(parse_bounded(
                "MIN_SESSION_MINUTES",
                DEFAULT_MIN_SESSION_MINUTES,
                1,
                MAX_MIN_SESSION_MINUTES,
            )?),
            conflict_policy,
            template_edit_policy,
            email_template_dir: env::var("EMAIL_TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.email_template_dir),
            strings_file: env::var("STRINGS_FILE").ok().map(PathBuf::from),
            web_base_url: env::var("WEB_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.web_base_url),
            contact_email: env::var("CONTACT_EMAIL").unwrap_or(defaults.contact_email),
            contact_phone: env::var("CONTACT_PHONE").ok().filter(|p| !p.is_empty()),
            email_queue_capacity: parse_var("EMAIL_QUEUE_CAPACITY", defaults.email_queue_capacity)?,
            lease_ttl: Duration::seconds(parse_bounded(
                "LEASE_TTL_SECONDS",
                defaults.lease_ttl.num_seconds(),
                1,
                MAX_LEASE_TTL_SECONDS,
            )?),
            instance_id: env::var("INSTANCE_ID").unwrap_or(defaults.instance_id),
            run_on_startup: parse_var("RUN_ON_STARTUP", defaults.run_on_startup)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges and cron expressions for configs built in code as well as from the
    /// environment.
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_HORIZON_DAYS).contains(&self.horizon_days) {
            return Err(eyre!("Horizon must be between 0 and {} days", MAX_HORIZON_DAYS));
        }
        if !(1..=MAX_LOOKAHEAD_DAYS).contains(&self.lookahead_days) {
            return Err(eyre!("Reminder lookahead must be between 1 and {} days", MAX_LOOKAHEAD_DAYS));
        }
        if self.jitter < Duration::zero() || self.jitter > Duration::seconds(MAX_JITTER_SECONDS) {
            return Err(eyre!("Jitter must be between 0 and {} seconds", MAX_JITTER_SECONDS));
        }
        if self.lease_ttl <= Duration::zero() || self.lease_ttl > Duration::seconds(MAX_LEASE_TTL_SECONDS) {
            return Err(eyre!("Lease TTL must be between 1 and {} seconds", MAX_LEASE_TTL_SECONDS));
        }
        if self.email_queue_capacity == 0 {
            return Err(eyre!("Email queue capacity must be at least 1"));
        }
        self.generation
            .schedule(self.timezone, self.jitter)
            .wrap_err("Invalid GENERATION_CRON")?;
        self.reminders
            .schedule(self.timezone, self.jitter)
            .wrap_err("Invalid REMINDER_CRON")?;
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .wrap_err_with(|| format!("Invalid value for {}: {}", name, value)),
        Err(_) => Ok(default),
    }
}

/// Parses an integer and rejects it before it can overflow a `Duration` or a date.
fn parse_bounded(name: &str, default: i64, min: i64, max: i64) -> Result<i64> {
    let value = parse_var(name, default)?;
    if !(min..=max).contains(&value) {
        return Err(eyre!("{} must be between {} and {}, got {}", name, min, max, value));
    }
    Ok(value)
}
