use axum::{routing::post, Router};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/jobs/generate", post(handlers::jobs::run_generation))
        .route("/api/jobs/reminders", post(handlers::jobs::run_reminders))
}
