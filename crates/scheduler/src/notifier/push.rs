//! Live push to connected clients.

use async_trait::async_trait;
use dashmap::DashMap;
use eyre::{eyre, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Event name clients listen on for new notifications.
pub const NOTIFICATION_EVENT: &str = "ReceiveNotification";

const DEFAULT_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub event: String,
    pub payload: Value,
}

#[async_trait]
pub trait PushChannel: Send + Sync {
    /// The live connection of `user_id`, if any.
    async fn connection_id(&self, user_id: Uuid) -> Option<String>;

    async fn send_to_connection(&self, connection_id: &str, event: &str, payload: Value) -> Result<()>;
}

/// In-process registry mapping each user to their current connection.
#[derive(Debug)]
pub struct ConnectionRegistry {
    by_user: DashMap<Uuid, String>,
    senders: DashMap<String, mpsc::Sender<PushMessage>>,
    buffer: usize,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_BUFFER)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            by_user: DashMap::new(),
            senders: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// Opens a connection for `user_id`, replacing any previous one.
    pub fn register(&self, user_id: Uuid) -> (String, mpsc::Receiver<PushMessage>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let connection_id = Uuid::new_v4().to_string();

        self.senders.insert(connection_id.clone(), tx);
        if let Some(previous) = self.by_user.insert(user_id, connection_id.clone()) {
            self.senders.remove(&previous);
        }

        debug!("Registered connection {} for user {}", connection_id, user_id);
        (connection_id, rx)
    }

    pub fn unregister(&self, connection_id: &str) {
        self.senders.remove(connection_id);
        self.by_user.retain(|_, id| id != connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.senders.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushChannel for ConnectionRegistry {
    async fn connection_id(&self, user_id: Uuid) -> Option<String> {
        self.by_user.get(&user_id).map(|entry| entry.value().clone())
    }

    async fn send_to_connection(&self, connection_id: &str, event: &str, payload: Value) -> Result<()> {
        let sender = self
            .senders
            .get(connection_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| eyre!("Connection {} is not registered", connection_id))?;

        let message = PushMessage {
            event: event.to_string(),
            payload,
        };
        match sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                Err(eyre!("Connection {} is not keeping up", connection_id))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.unregister(connection_id);
                Err(eyre!("Connection {} is closed", connection_id))
            }
        }
    }
}
