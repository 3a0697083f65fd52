//! Localized message strings with positional `{0}`, `{1}` arguments.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr};
use tracing::warn;

pub const UNASSIGNED_EXERCISE_REMINDER: &str = "UnassignedExerciseReminder";
pub const UNASSIGNED_EXERCISE_SUBJECT: &str = "UnassignedExerciseReminderSubject";
pub const SCHEDULE_CONFLICT_NOTICE: &str = "ScheduleConflictNotice";

const ENGLISH: &[(&str, &str)] = &[
    (
        UNASSIGNED_EXERCISE_REMINDER,
        "You have not assigned an exercise for your session on {0} from {1} to {2}.",
    ),
    (
        UNASSIGNED_EXERCISE_SUBJECT,
        "Reminder: assign an exercise for your session on {0}",
    ),
    (
        SCHEDULE_CONFLICT_NOTICE,
        "Your session on {0} from {1} to {2} was not scheduled because it overlaps another session from {3} to {4}.",
    ),
];

pub trait StringResources: Send + Sync {
    /// Looks up `key` and substitutes `args` into its placeholders.
    fn get_string(&self, key: &str, args: &[&str]) -> String;
}

#[derive(Debug, Clone)]
pub struct BundledStrings {
    entries: HashMap<String, String>,
}

impl BundledStrings {
    pub fn english() -> Self {
        Self {
            entries: ENGLISH
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }

    /// English defaults overridden by the entries of a flat JSON object.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read strings file {}", path.display()))?;
        let overrides: HashMap<String, String> = serde_json::from_str(&raw)
            .wrap_err_with(|| format!("Invalid strings file {}", path.display()))?;

        let mut strings = Self::english();
        strings.entries.extend(overrides);
        Ok(strings)
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl Default for BundledStrings {
    fn default() -> Self {
        Self::english()
    }
}

impl StringResources for BundledStrings {
    fn get_string(&self, key: &str, args: &[&str]) -> String {
        let Some(pattern) = self.entries.get(key) else {
            warn!("Missing string resource '{}'", key);
            return key.to_string();
        };

        args.iter()
            .enumerate()
            .fold(pattern.clone(), |text, (index, arg)| {
                text.replace(&format!("{{{}}}", index), arg)
            })
    }
}
