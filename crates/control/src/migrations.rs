use sqlx::{Pool, Sqlite};
use tracing::info;

/// Embedded migration scripts, applied in order. Each is idempotent.
const MIGRATIONS: &[(&str, &str)] = &[
    ("001 email_logs", include_str!("../migrations/001_email_logs.sql")),
    ("002 email_logs status index", include_str!("../migrations/002_email_logs_status_index.sql")),
];

pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    for (name, sql) in MIGRATIONS {
        info!("Running migration {}", name);
        sqlx::query(*sql).execute(pool).await?;
    }

    info!("All migrations completed successfully");
    Ok(())
}
