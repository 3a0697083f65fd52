pub mod notification;
pub mod relationship;
pub mod schedule;
pub mod time_slot;
