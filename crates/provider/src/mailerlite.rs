use async_trait::async_trait;
use mailer_models::{EmailPayload, MailerError, MailerLiteConfig};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const TIMEOUT_MESSAGE: &str = "Request timeout - email service took too long to respond";
pub const CONNECTION_MESSAGE: &str = "Connection error - could not reach email service";

/// Outcome of a single delivery attempt. Transport failures are folded in
/// with synthetic status codes (408, 503, 500) so callers only ever deal
/// with a status and a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub status_code: u16,
    pub body: String,
}

impl DeliveryReport {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[async_trait]
pub trait EmailProvider: Send + Sync + 'static {
    async fn send(&self, payload: &EmailPayload) -> DeliveryReport;
    fn name(&self) -> &'static str;
}

pub struct MailerLiteClient {
    client: Client,
    url: String,
    api_key: String,
}

impl MailerLiteClient {
    pub fn new(config: &MailerLiteConfig) -> Result<Self, MailerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MailerError::ProviderError { message: e.to_string() })?;

        if config.api_key.is_empty() {
            warn!("MailerLite API key is not set; deliveries will be rejected by the provider");
        }

        Ok(Self {
            client,
            url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EmailProvider for MailerLiteClient {
    #[instrument(skip(self, payload), fields(subject = %payload.subject))]
    async fn send(&self, payload: &EmailPayload) -> DeliveryReport {
        let result = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => return classify_transport_error(&e),
        };

        let status_code = response.status().as_u16();
        match response.text().await {
            Ok(body) => {
                info!(status_code, "MailerLite responded");
                DeliveryReport::new(status_code, body)
            }
            Err(e) => classify_transport_error(&e),
        }
    }

    fn name(&self) -> &'static str {
        "mailerlite"
    }
}

fn classify_transport_error(e: &reqwest::Error) -> DeliveryReport {
    if e.is_timeout() {
        warn!("MailerLite request timed out: {}", e);
        DeliveryReport::new(408, TIMEOUT_MESSAGE)
    } else if e.is_connect() {
        warn!("Could not connect to MailerLite: {}", e);
        DeliveryReport::new(503, CONNECTION_MESSAGE)
    } else {
        error!("MailerLite request failed: {}", e);
        DeliveryReport::new(500, format!("Email sending failed: {}", e))
    }
}
