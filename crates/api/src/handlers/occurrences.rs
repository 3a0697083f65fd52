use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;
use tutorsync_core::{
    errors::ScheduleError,
    models::schedule::{AssignExerciseRequest, ScheduleOccurrence},
    store::OccurrenceStore,
};
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

#[axum::debug_handler]
pub async fn get_occurrence(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleOccurrence>, AppError> {
    let occurrence = state
        .store
        .get_occurrence(id)
        .await?
        .ok_or_else(|| ScheduleError::NotFound(format!("Occurrence {}", id)))?;

    Ok(Json(occurrence))
}

/// Sets or clears the exercise of a session. Assigned sessions drop out of the reminder scan.
#[axum::debug_handler]
pub async fn assign_exercise(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignExerciseRequest>,
) -> Result<Json<ScheduleOccurrence>, AppError> {
    let occurrence = state
        .store
        .assign_exercise(id, payload.exercise_id, payload.exercise_type_id)
        .await?
        .ok_or_else(|| ScheduleError::NotFound(format!("Occurrence {}", id)))?;

    info!(
        "Occurrence {} is now {:?}",
        occurrence.id,
        occurrence.state()
    );
    Ok(Json(occurrence))
}
