use std::error::Error;
use tutorsync_core::errors::{ScheduleError, ScheduleResult};

#[test]
fn test_schedule_error_display() {
    let not_found = ScheduleError::NotFound("Template not found".to_string());
    let validation = ScheduleError::Validation("Invalid input".to_string());
    let conflict = ScheduleError::Conflict("Overlaps Monday 09:00-10:00".to_string());
    let database = ScheduleError::Database(eyre::eyre!("Database connection failed"));
    let internal = ScheduleError::Internal(Box::new(std::io::Error::new(
        std::io::ErrorKind::Other,
        "Internal error",
    )));

    assert_eq!(
        not_found.to_string(),
        "Resource not found: Template not found"
    );
    assert_eq!(validation.to_string(), "Validation error: Invalid input");
    assert_eq!(
        conflict.to_string(),
        "Schedule conflict: Overlaps Monday 09:00-10:00"
    );
    assert!(database.to_string().contains("Database error:"));
    assert!(internal.to_string().contains("Internal server error:"));
}

#[test]
fn test_error_source() {
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "IO error");
    let schedule_error = ScheduleError::Internal(Box::new(io_error));

    assert!(schedule_error.source().is_some());
}

#[test]
fn test_schedule_result() {
    let result: ScheduleResult<i32> = Ok(42);
    assert_eq!(result.unwrap(), 42);

    let result: ScheduleResult<i32> = Err(ScheduleError::NotFound("Not found".to_string()));
    assert!(result.is_err());
}

#[test]
fn test_from_eyre_report() {
    let schedule_error: ScheduleError = eyre::eyre!("pool timed out").into();

    assert!(matches!(schedule_error, ScheduleError::Database(_)));
    assert!(schedule_error.to_string().contains("pool timed out"));
}
