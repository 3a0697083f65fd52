//! # TutorSync Core
//!
//! Domain types shared by every TutorSync crate: weekly time-slot templates, the dated
//! occurrences materialized from them, tutor notifications, and the store traits the
//! scheduler and API are written against.

pub mod errors;
pub mod models;
pub mod overlap;
pub mod recurrence;
pub mod store;
