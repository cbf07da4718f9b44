use mailer_models::EmailStatus;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

pub struct TracingService;

impl TracingService {
    /// Installs the global subscriber. `RUST_LOG` drives filtering (default
    /// `info`); `LOG_FORMAT=json` switches to JSON lines with RFC 3339 UTC timestamps.
    pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if json {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_timer(UtcTime::rfc_3339())
                .try_init()
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_timer(UtcTime::rfc_3339())
                .try_init()
        }
    }

    pub fn log_email_queued(email_id: i64, receiver: &str, subject: &str) {
        info!(
            email_id = email_id,
            receiver = %receiver,
            subject = %subject,
            "Email queued"
        );
    }

    pub fn log_delivery_finished(email_id: i64, status: EmailStatus, status_code: u16, duration_ms: u64) {
        match status {
            EmailStatus::Sent => {
                info!(
                    email_id = email_id,
                    status = %status,
                    status_code = status_code,
                    duration_ms = duration_ms,
                    "Email delivered"
                );
            }
            _ => {
                warn!(
                    email_id = email_id,
                    status = %status,
                    status_code = status_code,
                    duration_ms = duration_ms,
                    "Email delivery failed"
                );
            }
        }
    }

    pub fn log_delivery_error(email_id: i64, error_message: &str) {
        error!(
            email_id = email_id,
            error_message = %error_message,
            "Email delivery error"
        );
    }

    pub fn log_stale_pending(count: u64) {
        if count > 0 {
            warn!(count = count, "Marked emails left pending by a previous run as failed");
        }
    }
}
