use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use tracing::warn;
use tutorsync_core::{
    models::notification::{NotificationQuery, NotificationRecord},
    store::NotificationStore,
};
use tutorsync_scheduler::notifier::push::ConnectionRegistry;
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<NotificationRecord>>, AppError> {
    let notifications = state
        .store
        .notifications_for(user_id, query.unread_only)
        .await?;

    Ok(Json(notifications))
}

/// Unregisters the connection once the client goes away.
struct ConnectionGuard {
    registry: Arc<ConnectionRegistry>,
    connection_id: String,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.connection_id);
    }
}

/// Live notification stream for a user as server-sent events.
pub async fn stream_events(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (connection_id, receiver) = state.connections.register(user_id);
    let guard = ConnectionGuard {
        registry: Arc::clone(&state.connections),
        connection_id,
    };

    let events = stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
        let message = receiver.recv().await?;
        let event = Event::default()
            .event(&message.event)
            .json_data(&message.payload)
            .unwrap_or_else(|e| {
                warn!("Dropping unserializable push payload: {}", e);
                Event::default().comment("unserializable payload")
            });
        Some((Ok(event), (receiver, guard)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
