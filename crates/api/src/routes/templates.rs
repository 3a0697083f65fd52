use axum::{
    routing::{post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/templates", post(handlers::templates::create_template))
        .route(
            "/api/templates/:id",
            put(handlers::templates::update_template).delete(handlers::templates::remove_template),
        )
}
