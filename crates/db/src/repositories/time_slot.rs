use crate::models::{DbActiveTemplate, DbTimeSlotTemplate};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use tutorsync_core::{models::time_slot::TimeSlotTemplate, recurrence::weekday_index};
use uuid::Uuid;

pub async fn create_template(
    pool: &Pool<Postgres>,
    template: &TimeSlotTemplate,
) -> Result<DbTimeSlotTemplate> {
    let created = sqlx::query_as::<_, DbTimeSlotTemplate>(
        r#"
        INSERT INTO time_slot_templates
            (id, relationship_id, weekday, start_time, end_time, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, relationship_id, weekday, start_time, end_time, is_active, created_at, updated_at
        "#,
    )
    .bind(template.id)
    .bind(template.relationship_id)
    .bind(weekday_index(template.weekday))
    .bind(template.start_time)
    .bind(template.end_time)
    .bind(template.is_active)
    .bind(template.created_at)
    .bind(template.updated_at)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn get_template_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbTimeSlotTemplate>> {
    let template = sqlx::query_as::<_, DbTimeSlotTemplate>(
        r#"
        SELECT id, relationship_id, weekday, start_time, end_time, is_active, created_at, updated_at
        FROM time_slot_templates
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(template)
}

pub async fn get_active_templates_for_teaching(
    pool: &Pool<Postgres>,
) -> Result<Vec<DbActiveTemplate>> {
    let templates = sqlx::query_as::<_, DbActiveTemplate>(
        r#"
        SELECT t.id, t.relationship_id, t.weekday, t.start_time, t.end_time, t.is_active,
               t.created_at, t.updated_at, r.tutor_id, r.student_id, r.status
        FROM time_slot_templates t
        JOIN relationships r ON r.id = t.relationship_id
        WHERE t.is_active AND r.status = 'teaching'
        ORDER BY t.created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(templates)
}

pub async fn get_tutor_templates_on(
    pool: &Pool<Postgres>,
    tutor_id: Uuid,
    weekday: i16,
) -> Result<Vec<DbTimeSlotTemplate>> {
    let templates = sqlx::query_as::<_, DbTimeSlotTemplate>(
        r#"
        SELECT t.id, t.relationship_id, t.weekday, t.start_time, t.end_time, t.is_active,
               t.created_at, t.updated_at
        FROM time_slot_templates t
        JOIN relationships r ON r.id = t.relationship_id
        WHERE r.tutor_id = $1 AND t.weekday = $2 AND t.is_active AND r.status <> 'ended'
        ORDER BY t.start_time ASC
        "#,
    )
    .bind(tutor_id)
    .bind(weekday)
    .fetch_all(pool)
    .await?;

    Ok(templates)
}

pub async fn update_template(
    pool: &Pool<Postgres>,
    template: &TimeSlotTemplate,
) -> Result<DbTimeSlotTemplate> {
    let updated = sqlx::query_as::<_, DbTimeSlotTemplate>(
        r#"
        UPDATE time_slot_templates
        SET weekday = $2, start_time = $3, end_time = $4, is_active = $5, updated_at = $6
        WHERE id = $1
        RETURNING id, relationship_id, weekday, start_time, end_time, is_active, created_at, updated_at
        "#,
    )
    .bind(template.id)
    .bind(weekday_index(template.weekday))
    .bind(template.start_time)
    .bind(template.end_time)
    .bind(template.is_active)
    .bind(template.updated_at)
    .fetch_one(pool)
    .await?;

    Ok(updated)
}

pub async fn deactivate_template(
    pool: &Pool<Postgres>,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE time_slot_templates
        SET is_active = FALSE, updated_at = $2
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}
