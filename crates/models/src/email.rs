use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

use crate::MailerError;

pub const QUEUED_MESSAGE: &str = "Email queued for sending in background";
pub const PENDING_RESPONSE: &str = "Email queued for sending";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Pending,
    Sent,
    Failed,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Pending => "pending",
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EmailStatus::Pending),
            "sent" => Ok(EmailStatus::Sent),
            "failed" => Ok(EmailStatus::Failed),
            _ => Err(format!("Invalid email status: {}", s)),
        }
    }
}

/// Variables for the embedded email templates. Every field is optional and
/// falls back to a neutral default when the template is rendered.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct TemplateData {
    pub company_name: Option<String>,
    pub login_url: Option<String>,
    pub support_url: Option<String>,
    pub year: Option<i32>,
}

/// Unrecognized fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EmailRequest {
    pub sender_email: String,
    pub sender_name: String,
    pub receiver_email: String,
    pub receiver_name: String,
    pub subject: String,
    /// HTML body, sent verbatim unless `template` is set.
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_data: Option<TemplateData>,
}

impl EmailRequest {
    pub fn validate(&self) -> Result<(), MailerError> {
        if !is_valid_email(&self.sender_email) {
            return Err(MailerError::InvalidEmailAddress {
                field: "sender_email".to_string(),
                address: self.sender_email.clone(),
            });
        }
        if !is_valid_email(&self.receiver_email) {
            return Err(MailerError::InvalidEmailAddress {
                field: "receiver_email".to_string(),
                address: self.receiver_email.clone(),
            });
        }
        if self.subject.trim().is_empty() {
            return Err(MailerError::InvalidRequest {
                reason: "subject must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn to_payload(&self, html: String) -> EmailPayload {
        EmailPayload {
            from: Contact {
                email: self.sender_email.clone(),
                name: self.sender_name.clone(),
            },
            to: vec![Contact {
                email: self.receiver_email.clone(),
                name: self.receiver_name.clone(),
            }],
            subject: self.subject.clone(),
            html,
            text: self.text.clone().filter(|t| !t.is_empty()),
        }
    }
}

/// Syntactic address check: one `@`, a non-empty local part, and a dotted
/// domain with no empty labels. No whitespace anywhere.
pub fn is_valid_email(address: &str) -> bool {
    if address.is_empty() || address.len() > 254 || address.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }

    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Contact {
    pub email: String,
    pub name: String,
}

/// Body of the MailerLite send-email call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EmailPayload {
    pub from: Contact,
    pub to: Vec<Contact>,
    pub subject: String,
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailLog {
    pub id: i64,
    pub sender_email: String,
    pub receiver_email: String,
    pub subject: String,
    pub status: EmailStatus,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct QueuedResponse {
    pub status: String,
    pub email_id: i64,
    pub message: String,
}

impl QueuedResponse {
    pub fn queued(email_id: i64) -> Self {
        Self {
            status: "queued".to_string(),
            email_id,
            message: QUEUED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    /// Page number, 1-indexed
    pub page: Option<i64>,
    /// Only return emails with this status (pending, sent, failed)
    pub status: Option<String>,
}

impl StatusQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn status_filter(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EmailLogView {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub subject: String,
    pub status: EmailStatus,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<EmailLog> for EmailLogView {
    fn from(log: EmailLog) -> Self {
        Self {
            id: log.id,
            sender: log.sender_email,
            receiver: log.receiver_email,
            subject: log.subject,
            status: log.status,
            response: log.response,
            created_at: log.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StatusPage {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub data: Vec<EmailLogView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
