use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tutorsync_core::models::time_slot::{CreateTemplateRequest, TemplateResponse, UpdateTemplateRequest};
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

#[derive(Debug, Serialize)]
pub struct RemoveTemplateResponse {
    pub id: Uuid,
    pub hidden_occurrences: u64,
}

#[axum::debug_handler]
pub async fn create_template(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>), AppError> {
    let template = state.templates.create(payload).await?;
    Ok((StatusCode::CREATED, Json(template.into())))
}

#[axum::debug_handler]
pub async fn update_template(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> Result<Json<TemplateResponse>, AppError> {
    let template = state.templates.update(id, payload).await?;
    Ok(Json(template.into()))
}

#[axum::debug_handler]
pub async fn remove_template(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RemoveTemplateResponse>, AppError> {
    let hidden_occurrences = state.templates.remove(id).await?;
    Ok(Json(RemoveTemplateResponse {
        id,
        hidden_occurrences,
    }))
}
