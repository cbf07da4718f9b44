#![allow(dead_code)]

use mailer_control::EmailLogStore;
use mailer_models::{EmailLog, EmailRequest, EmailStatus};
use std::time::Duration;

pub fn request(receiver: &str) -> EmailRequest {
    EmailRequest {
        sender_email: "team@example.com".to_string(),
        sender_name: "Team".to_string(),
        receiver_email: receiver.to_string(),
        receiver_name: "Ana".to_string(),
        subject: "Hello".to_string(),
        content: "<p>Hello Ana</p>".to_string(),
        text: None,
        template: None,
        template_data: None,
    }
}

/// Polls the log until the row leaves `pending` or the deadline passes.
pub async fn wait_for_final(store: &EmailLogStore, id: i64) -> anyhow::Result<EmailLog> {
    for _ in 0..200 {
        let log = store.get(id).await?;
        if log.status != EmailStatus::Pending {
            return Ok(log);
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    anyhow::bail!("email {} still pending", id)
}
