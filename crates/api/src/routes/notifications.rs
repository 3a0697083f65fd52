use axum::{routing::get, Router};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/users/:id/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route("/api/users/:id/events", get(handlers::notifications::stream_events))
}
