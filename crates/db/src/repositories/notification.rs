use crate::models::DbNotification;
use eyre::Result;
use sqlx::{Pool, Postgres};
use tutorsync_core::models::notification::NotificationRecord;
use uuid::Uuid;

/// Returns `None` when a notification with the same dedup key already exists.
pub async fn create_notification(
    pool: &Pool<Postgres>,
    record: &NotificationRecord,
) -> Result<Option<DbNotification>> {
    let notification = sqlx::query_as::<_, DbNotification>(
        r#"
        INSERT INTO notifications (id, receiver_id, message, url, is_read, created_at, dedup_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (dedup_key) DO NOTHING
        RETURNING id, receiver_id, message, url, is_read, created_at, dedup_key
        "#,
    )
    .bind(record.id)
    .bind(record.receiver_id)
    .bind(&record.message)
    .bind(&record.url)
    .bind(record.is_read)
    .bind(record.created_at)
    .bind(record.dedup_key.as_deref())
    .fetch_optional(pool)
    .await?;

    Ok(notification)
}

pub async fn get_notifications_for_receiver(
    pool: &Pool<Postgres>,
    receiver_id: Uuid,
    unread_only: bool,
) -> Result<Vec<DbNotification>> {
    let notifications = sqlx::query_as::<_, DbNotification>(
        r#"
        SELECT id, receiver_id, message, url, is_read, created_at, dedup_key
        FROM notifications
        WHERE receiver_id = $1 AND (NOT $2 OR NOT is_read)
        ORDER BY created_at DESC
        "#,
    )
    .bind(receiver_id)
    .bind(unread_only)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}
