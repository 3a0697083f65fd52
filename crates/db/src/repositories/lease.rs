use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};

/// Claims the lease when it is free, expired, or already ours.
pub async fn try_acquire_lease(
    pool: &Pool<Postgres>,
    name: &str,
    holder: &str,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<bool> {
    let acquired = sqlx::query_scalar::<_, String>(
        r#"
        INSERT INTO job_leases (name, holder, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE
        SET holder = EXCLUDED.holder, expires_at = EXCLUDED.expires_at
        WHERE job_leases.expires_at <= $4 OR job_leases.holder = EXCLUDED.holder
        RETURNING name
        "#,
    )
    .bind(name)
    .bind(holder)
    .bind(expires_at)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(acquired.is_some())
}

pub async fn release_lease(pool: &Pool<Postgres>, name: &str, holder: &str) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM job_leases
        WHERE name = $1 AND holder = $2
        "#,
    )
    .bind(name)
    .bind(holder)
    .execute(pool)
    .await?;

    Ok(())
}
