use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ErrorShape {
    pub error_message: String,
    pub error_type: String,
}

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Invalid email address for {field}: {address}")]
    InvalidEmailAddress { field: String, address: String },

    #[error("Email log not found: {id}")]
    EmailLogNotFound { id: i64 },

    #[error("Delivery queue unavailable")]
    QueueUnavailable,

    #[error("Email provider error: {message}")]
    ProviderError { message: String },

    #[error("Email template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Template rendering failed: {reason}")]
    TemplateError { reason: String },

    #[error("Internal server error: {reason}")]
    InternalError { reason: String },

    #[error("Database error: {reason}")]
    DatabaseError { reason: String },

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },
}

impl MailerError {
    pub fn to_error_shape(&self) -> ErrorShape {
        ErrorShape {
            error_message: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            MailerError::InvalidRequest { .. } => "ValidationError",
            MailerError::InvalidEmailAddress { .. } => "ValidationError",
            MailerError::EmailLogNotFound { .. } => "NotFound",
            MailerError::QueueUnavailable => "ServiceUnavailable",
            MailerError::ProviderError { .. } => "ProviderError",
            MailerError::TemplateNotFound { .. } => "ValidationError",
            MailerError::TemplateError { .. } => "ServiceException",
            MailerError::InternalError { .. } => "ServiceException",
            MailerError::DatabaseError { .. } => "ServiceException",
            MailerError::SqlxError(_) => "ServiceException",
            MailerError::ConfigError { .. } => "ServiceException",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            MailerError::InvalidRequest { .. } => 422,
            MailerError::InvalidEmailAddress { .. } => 422,
            MailerError::EmailLogNotFound { .. } => 404,
            MailerError::QueueUnavailable => 503,
            MailerError::ProviderError { .. } => 502,
            MailerError::TemplateNotFound { .. } => 422,
            MailerError::TemplateError { .. } => 500,
            MailerError::InternalError { .. } => 500,
            MailerError::DatabaseError { .. } => 500,
            MailerError::SqlxError(_) => 500,
            MailerError::ConfigError { .. } => 500,
        }
    }
}
