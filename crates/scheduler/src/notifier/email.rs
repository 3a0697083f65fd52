//! Outgoing email: a bounded queue the notifier writes to and a worker that drains it.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Accepts a message for later delivery. Never waits for the send itself.
#[async_trait]
pub trait EmailQueue: Send + Sync {
    async fn enqueue(&self, message: EmailMessage) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ChannelEmailQueue {
    sender: mpsc::Sender<EmailMessage>,
}

impl ChannelEmailQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<EmailMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EmailQueue for ChannelEmailQueue {
    async fn enqueue(&self, message: EmailMessage) -> Result<()> {
        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(m) => eyre!("Email queue is full, dropping mail to {}", m.to),
            mpsc::error::TrySendError::Closed(m) => eyre!("Email queue is closed, dropping mail to {}", m.to),
        })
    }
}

/// Delivers a single message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, message: &EmailMessage) -> Result<()>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn deliver(&self, message: &EmailMessage) -> Result<()> {
        info!(
            "Email to {}: {} ({} bytes)",
            message.to,
            message.subject,
            message.html_body.len()
        );
        Ok(())
    }
}

pub struct EmailWorker {
    receiver: mpsc::Receiver<EmailMessage>,
    transport: Arc<dyn MailTransport>,
}

impl EmailWorker {
    pub fn new(receiver: mpsc::Receiver<EmailMessage>, transport: Arc<dyn MailTransport>) -> Self {
        Self { receiver, transport }
    }

    /// Delivers queued mail until cancelled or every sender is gone. Mail already queued at
    /// cancellation is still delivered.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        info!("Email worker started");

        loop {
            tokio::select! {
                message = self.receiver.recv() => match message {
                    Some(message) => self.deliver(&message).await,
                    None => break,
                },
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        while let Ok(message) = self.receiver.try_recv() {
                            self.deliver(&message).await;
                        }
                        break;
                    }
                }
            }
        }

        info!("Email worker stopped");
    }

    async fn deliver(&self, message: &EmailMessage) {
        if let Err(e) = self.transport.deliver(message).await {
            error!("Failed to deliver email to {}: {:?}", message.to, e);
        }
    }
}
