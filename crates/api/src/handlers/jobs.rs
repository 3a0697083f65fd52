//! Manual triggers for the recurring jobs, for operators and backfills.
//!
//! A trigger claims the job's lease first, so it never overlaps a scheduled run on another
//! instance. The claim is held until its TTL runs out, like a scheduled tick.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use tutorsync_core::errors::ScheduleError;
use tutorsync_scheduler::{
    clock::Clock, generator::GenerationReport, reminders::ReminderReport, runner::ScheduledJob,
};

use crate::{middleware::error_handling::AppError, ApiState};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Without a range this runs a normal cycle: complete past sessions and fill the horizon.
#[axum::debug_handler]
pub async fn run_generation(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<GenerateParams>,
) -> Result<Json<GenerationReport>, AppError> {
    let range = match (params.start, params.end) {
        (Some(start), Some(end)) => Some((start, end)),
        (None, None) => None,
        _ => {
            return Err(AppError(ScheduleError::Validation(
                "Both start and end are required for a custom range".to_string(),
            )));
        }
    };

    claim(&state, state.generator.as_ref()).await?;
    let report = match range {
        Some((start, end)) => state.generator.generate(start, end).await?,
        None => state.generator.run_cycle().await?,
    };

    Ok(Json(report))
}

#[axum::debug_handler]
pub async fn run_reminders(State(state): State<Arc<ApiState>>) -> Result<Json<ReminderReport>, AppError> {
    claim(&state, state.reminders.as_ref()).await?;
    Ok(Json(state.reminders.run_cycle().await?))
}

async fn claim(state: &ApiState, job: &dyn ScheduledJob) -> Result<(), AppError> {
    let name = job.name();
    if !state.lease.acquire(name, state.clock.now()).await? {
        return Err(AppError(ScheduleError::Conflict(format!(
            "Job '{}' is running on another instance",
            name
        ))));
    }
    info!("Manual run of '{}' claimed by {}", name, state.lease.holder());
    Ok(())
}
