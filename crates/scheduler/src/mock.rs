use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;
use uuid::Uuid;

use crate::notifier::email::{EmailMessage, EmailQueue};
use crate::notifier::push::PushChannel;

mock! {
    pub PushHub {}

    #[async_trait]
    impl PushChannel for PushHub {
        async fn connection_id(&self, user_id: Uuid) -> Option<String>;
        async fn send_to_connection(&self, connection_id: &str, event: &str, payload: Value) -> eyre::Result<()>;
    }
}

mock! {
    pub MailQueue {}

    #[async_trait]
    impl EmailQueue for MailQueue {
        async fn enqueue(&self, message: EmailMessage) -> eyre::Result<()>;
    }
}
