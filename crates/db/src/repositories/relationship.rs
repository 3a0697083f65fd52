use crate::models::{DbRelationship, DbUser};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn get_relationship_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbRelationship>> {
    let relationship = sqlx::query_as::<_, DbRelationship>(
        r#"
        SELECT id, tutor_id, student_id, status
        FROM relationships
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(relationship)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT id, display_name, email, phone
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
