use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Users are owned by the identity service; only contact columns are read here
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            display_name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL,
            phone VARCHAR(64) NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create relationships table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS relationships (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            tutor_id UUID NOT NULL REFERENCES users(id),
            student_id UUID NOT NULL REFERENCES users(id),
            status VARCHAR(32) NOT NULL DEFAULT 'pending'
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create time_slot_templates table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS time_slot_templates (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            relationship_id UUID NOT NULL REFERENCES relationships(id),
            weekday SMALLINT NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_weekday CHECK (weekday BETWEEN 0 AND 6),
            CONSTRAINT valid_template_range CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create schedule_occurrences table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedule_occurrences (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            relationship_id UUID NOT NULL REFERENCES relationships(id),
            template_id UUID NULL REFERENCES time_slot_templates(id),
            occurrence_date DATE NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            exercise_id UUID NULL,
            exercise_type_id UUID NULL,
            is_hidden BOOLEAN NOT NULL DEFAULT FALSE,
            status VARCHAR(32) NOT NULL DEFAULT 'teaching',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_occurrence_range CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create notifications table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            receiver_id UUID NOT NULL,
            message TEXT NOT NULL,
            url TEXT NOT NULL,
            is_read BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            dedup_key VARCHAR(255) NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create job_leases table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_leases (
            name VARCHAR(128) PRIMARY KEY,
            holder VARCHAR(255) NOT NULL,
            expires_at TIMESTAMP WITH TIME ZONE NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes, one statement each since prepared statements cannot batch
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_relationships_tutor_id ON relationships(tutor_id)",
        "CREATE INDEX IF NOT EXISTS idx_relationships_student_id ON relationships(student_id)",
        "CREATE INDEX IF NOT EXISTS idx_templates_relationship_id ON time_slot_templates(relationship_id)",
        "CREATE INDEX IF NOT EXISTS idx_occurrences_date ON schedule_occurrences(occurrence_date)",
        "CREATE INDEX IF NOT EXISTS idx_occurrences_template_id ON schedule_occurrences(template_id)",
        "CREATE INDEX IF NOT EXISTS idx_notifications_receiver_id ON notifications(receiver_id)",
        // Hidden rows free their slot so a recreated template can materialize it again
        "ALTER TABLE schedule_occurrences DROP CONSTRAINT IF EXISTS unique_occurrence_slot",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_occurrences_visible_slot \
         ON schedule_occurrences(relationship_id, occurrence_date, start_time) WHERE NOT is_hidden",
    ];
    for statement in indexes {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
