use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/occurrences/:id", get(handlers::occurrences::get_occurrence))
        .route(
            "/api/occurrences/:id/exercise",
            put(handlers::occurrences::assign_exercise),
        )
}
