use chrono::Utc;
use mailer_models::{EmailLog, EmailRequest, EmailStatus, MailerError, PENDING_RESPONSE};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{info, instrument};

use crate::migrations::run_migrations;

/// Opens a pool for `db_url`, creating the database file when missing.
/// In-memory databases get a single long-lived connection so every query
/// sees the same database.
pub async fn connect_pool(db_url: &str) -> Result<SqlitePool, MailerError> {
    let options = SqliteConnectOptions::from_str(db_url)
        .map_err(|e| MailerError::ConfigError { reason: format!("Invalid database URL {}: {}", db_url, e) })?
        .create_if_missing(true);

    let pool = if db_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new().connect_with(options).await?
    };

    Ok(pool)
}

#[derive(Clone)]
pub struct EmailLogStore {
    pool: SqlitePool,
}

impl EmailLogStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, MailerError> {
        run_migrations(&pool)
            .await
            .map_err(|e| MailerError::DatabaseError { reason: e.to_string() })?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[instrument(skip(self, request), fields(receiver = %request.receiver_email))]
    pub async fn create_pending(&self, request: &EmailRequest) -> Result<EmailLog, MailerError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO email_logs (sender_email, receiver_email, subject, status, response, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.sender_email)
        .bind(&request.receiver_email)
        .bind(&request.subject)
        .bind(EmailStatus::Pending.as_str())
        .bind(PENDING_RESPONSE)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let log = EmailLog {
            id: result.last_insert_rowid(),
            sender_email: request.sender_email.clone(),
            receiver_email: request.receiver_email.clone(),
            subject: request.subject.clone(),
            status: EmailStatus::Pending,
            response: Some(PENDING_RESPONSE.to_string()),
            created_at,
        };

        info!("Created email log {}", log.id);
        Ok(log)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<EmailLog, MailerError> {
        let row = sqlx::query("SELECT * FROM email_logs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(MailerError::EmailLogNotFound { id })?;

        row_to_email_log(&row)
    }

    #[instrument(skip(self, response))]
    pub async fn update_status(&self, id: i64, status: EmailStatus, response: &str) -> Result<(), MailerError> {
        let result = sqlx::query("UPDATE email_logs SET status = ?, response = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(response)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MailerError::EmailLogNotFound { id });
        }

        Ok(())
    }

    /// One page of logs, newest first, plus the total number of matching rows.
    #[instrument(skip(self))]
    pub async fn list(&self, page: i64, per_page: i64, status: Option<&str>) -> Result<(i64, Vec<EmailLog>), MailerError> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let offset = (page - 1).saturating_mul(per_page);

        let (total, rows) = match status {
            Some(status) => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM email_logs WHERE status = ?")
                    .bind(status)
                    .fetch_one(&self.pool)
                    .await?;
                let rows = sqlx::query(
                    "SELECT * FROM email_logs WHERE status = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                )
                .bind(status)
                .bind(per_page)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
                (total, rows)
            }
            None => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM email_logs")
                    .fetch_one(&self.pool)
                    .await?;
                let rows = sqlx::query("SELECT * FROM email_logs ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?")
                    .bind(per_page)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?;
                (total, rows)
            }
        };

        let logs = rows.iter().map(row_to_email_log).collect::<Result<Vec<_>, _>>()?;
        Ok((total, logs))
    }

    /// Rows still `pending` at startup belong to a previous process whose
    /// in-memory queue is gone; the payload was never stored, so they are failed.
    #[instrument(skip(self))]
    pub async fn fail_stale_pending(&self, reason: &str) -> Result<u64, MailerError> {
        let result = sqlx::query("UPDATE email_logs SET status = ?, response = ? WHERE status = ?")
            .bind(EmailStatus::Failed.as_str())
            .bind(reason)
            .bind(EmailStatus::Pending.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn row_to_email_log(row: &SqliteRow) -> Result<EmailLog, MailerError> {
    let status: String = row.try_get("status")?;
    let status = EmailStatus::from_str(&status).map_err(|reason| MailerError::DatabaseError { reason })?;

    Ok(EmailLog {
        id: row.try_get("id")?,
        sender_email: row.try_get("sender_email")?,
        receiver_email: row.try_get("receiver_email")?,
        subject: row.try_get("subject")?,
        status,
        response: row.try_get("response")?,
        created_at: row.try_get("created_at")?,
    })
}
