use anyhow::Result;
use mailer_models::{EmailRequest, HealthResponse, QueuedResponse, StatusPage};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

pub struct MailerClient {
    client: Client,
    base_url: String,
}

impl MailerClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.client.get(format!("{}/health", self.base_url)).send().await?;
        Self::json_or_bail(response, "Health check").await
    }

    pub async fn send_email(&self, request: &EmailRequest) -> Result<QueuedResponse> {
        let response = self.send_email_raw(&serde_json::to_value(request)?).await?;
        Self::json_or_bail(response, "Send email").await
    }

    /// Posts an arbitrary body and returns the status and JSON response.
    pub async fn send_email_value(&self, body: &Value) -> Result<(StatusCode, Value)> {
        let response = self.send_email_raw(body).await?;
        let status = response.status();
        Ok((status, response.json().await?))
    }

    async fn send_email_raw(&self, body: &Value) -> Result<Response> {
        Ok(self
            .client
            .post(format!("{}/send-email", self.base_url))
            .json(body)
            .send()
            .await?)
    }

    pub async fn status(&self, page: Option<i64>, status: Option<&str>) -> Result<StatusPage> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/api/status", self.base_url))
            .query(&query)
            .send()
            .await?;
        Self::json_or_bail(response, "Get status").await
    }

    pub async fn get_text(&self, path: &str) -> Result<(StatusCode, String)> {
        let response = self.client.get(format!("{}{}", self.base_url, path)).send().await?;
        let status = response.status();
        Ok((status, response.text().await?))
    }

    async fn json_or_bail<T: serde::de::DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("{} failed: {}", what, error_text);
        }
        Ok(response.json().await?)
    }
}
