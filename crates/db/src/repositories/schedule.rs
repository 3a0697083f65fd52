use crate::models::DbOccurrence;
use chrono::{NaiveDate, NaiveTime};
use eyre::Result;
use sqlx::{Pool, Postgres};
use tutorsync_core::models::schedule::ScheduleOccurrence;
use uuid::Uuid;

const OCCURRENCE_COLUMNS: &str = "o.id, o.relationship_id, o.template_id, o.occurrence_date, \
     o.start_time, o.end_time, o.exercise_id, o.exercise_type_id, o.is_hidden, o.status, o.created_at";

pub async fn occurrence_exists(
    pool: &Pool<Postgres>,
    relationship_id: Uuid,
    date: NaiveDate,
    start_time: NaiveTime,
) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM schedule_occurrences
            WHERE relationship_id = $1 AND occurrence_date = $2 AND start_time = $3
              AND NOT is_hidden
        )
        "#,
    )
    .bind(relationship_id)
    .bind(date)
    .bind(start_time)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn get_occurrence_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbOccurrence>> {
    let occurrence = sqlx::query_as::<_, DbOccurrence>(&format!(
        "SELECT {} FROM schedule_occurrences o WHERE o.id = $1",
        OCCURRENCE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(occurrence)
}

pub async fn get_participant_occurrences_on(
    pool: &Pool<Postgres>,
    tutor_id: Uuid,
    student_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<DbOccurrence>> {
    let occurrences = sqlx::query_as::<_, DbOccurrence>(&format!(
        r#"
        SELECT {}
        FROM schedule_occurrences o
        JOIN relationships r ON r.id = o.relationship_id
        WHERE o.occurrence_date = $3
          AND NOT o.is_hidden
          AND (r.tutor_id = $1 OR r.student_id = $2)
        ORDER BY o.start_time ASC
        "#,
        OCCURRENCE_COLUMNS
    ))
    .bind(tutor_id)
    .bind(student_id)
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(occurrences)
}

/// Inserts the batch in one transaction, skipping slots a visible occurrence already holds.
pub async fn insert_occurrences(
    pool: &Pool<Postgres>,
    occurrences: &[ScheduleOccurrence],
) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for occurrence in occurrences {
        let result = sqlx::query(
            r#"
            INSERT INTO schedule_occurrences
                (id, relationship_id, template_id, occurrence_date, start_time, end_time,
                 exercise_id, exercise_type_id, is_hidden, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (relationship_id, occurrence_date, start_time) WHERE NOT is_hidden DO NOTHING
            "#,
        )
        .bind(occurrence.id)
        .bind(occurrence.relationship_id)
        .bind(occurrence.template_id)
        .bind(occurrence.date)
        .bind(occurrence.start_time)
        .bind(occurrence.end_time)
        .bind(occurrence.exercise_id)
        .bind(occurrence.exercise_type_id)
        .bind(occurrence.is_hidden)
        .bind(occurrence.status.as_str())
        .bind(occurrence.created_at)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

pub async fn get_unassigned_occurrences(
    pool: &Pool<Postgres>,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<Vec<DbOccurrence>> {
    let occurrences = sqlx::query_as::<_, DbOccurrence>(&format!(
        r#"
        SELECT {}
        FROM schedule_occurrences o
        JOIN relationships r ON r.id = o.relationship_id
        WHERE o.occurrence_date > $1
          AND o.occurrence_date <= $2
          AND NOT o.is_hidden
          AND o.status = 'teaching'
          AND r.status = 'teaching'
          AND (o.exercise_id IS NULL OR o.exercise_type_id IS NULL)
        ORDER BY o.occurrence_date ASC, o.start_time ASC
        "#,
        OCCURRENCE_COLUMNS
    ))
    .bind(window_start)
    .bind(window_end)
    .fetch_all(pool)
    .await?;

    Ok(occurrences)
}

pub async fn get_template_occurrences_from(
    pool: &Pool<Postgres>,
    template_id: Uuid,
    from: NaiveDate,
) -> Result<Vec<DbOccurrence>> {
    let occurrences = sqlx::query_as::<_, DbOccurrence>(&format!(
        r#"
        SELECT {}
        FROM schedule_occurrences o
        WHERE o.template_id = $1
          AND o.occurrence_date >= $2
          AND NOT o.is_hidden
          AND o.status <> 'completed'
        ORDER BY o.occurrence_date ASC
        "#,
        OCCURRENCE_COLUMNS
    ))
    .bind(template_id)
    .bind(from)
    .fetch_all(pool)
    .await?;

    Ok(occurrences)
}

pub async fn reschedule_occurrence(
    pool: &Pool<Postgres>,
    id: Uuid,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE schedule_occurrences
        SET start_time = $2, end_time = $3
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(start_time)
    .bind(end_time)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn hide_occurrences(pool: &Pool<Postgres>, ids: &[Uuid]) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE schedule_occurrences
        SET is_hidden = TRUE
        WHERE id = ANY($1) AND NOT is_hidden
        "#,
    )
    .bind(ids)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn assign_exercise(
    pool: &Pool<Postgres>,
    id: Uuid,
    exercise_id: Option<Uuid>,
    exercise_type_id: Option<Uuid>,
) -> Result<Option<DbOccurrence>> {
    let occurrence = sqlx::query_as::<_, DbOccurrence>(
        r#"
        UPDATE schedule_occurrences
        SET exercise_id = $2, exercise_type_id = $3
        WHERE id = $1
        RETURNING id, relationship_id, template_id, occurrence_date, start_time, end_time,
                  exercise_id, exercise_type_id, is_hidden, status, created_at
        "#,
    )
    .bind(id)
    .bind(exercise_id)
    .bind(exercise_type_id)
    .fetch_optional(pool)
    .await?;

    Ok(occurrence)
}

pub async fn complete_occurrences_before(pool: &Pool<Postgres>, date: NaiveDate) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE schedule_occurrences
        SET status = 'completed'
        WHERE occurrence_date < $1 AND status = 'teaching' AND NOT is_hidden
        "#,
    )
    .bind(date)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
