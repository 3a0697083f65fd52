pub mod jobs;
pub mod notifications;
pub mod occurrences;
pub mod templates;
