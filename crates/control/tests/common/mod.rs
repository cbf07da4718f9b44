#![allow(dead_code)]

use async_trait::async_trait;
use mailer_control::{connect_pool, Deliverer, EmailLogStore};
use mailer_metrics::MetricsService;
use mailer_models::{EmailPayload, EmailRequest, TemplateData};
use mailer_provider::{DeliveryReport, EmailProvider};
use mailer_templates::Templates;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub async fn memory_store() -> EmailLogStore {
    let pool = connect_pool("sqlite::memory:").await.unwrap();
    EmailLogStore::new(pool).await.unwrap()
}

pub fn request(receiver: &str, subject: &str) -> EmailRequest {
    EmailRequest {
        sender_email: "team@example.com".into(),
        sender_name: "Team".into(),
        receiver_email: receiver.into(),
        receiver_name: "Ana".into(),
        subject: subject.into(),
        content: "<p>Hello</p>".into(),
        text: None,
        template: None,
        template_data: None,
    }
}

pub fn welcome_request(receiver: &str) -> EmailRequest {
    EmailRequest {
        template: Some("welcome".into()),
        template_data: Some(TemplateData {
            company_name: Some("Acme".into()),
            ..Default::default()
        }),
        ..request(receiver, "Welcome")
    }
}

/// Provider double: replays scripted reports (then `fallback`) and records payloads.
pub struct ScriptedProvider {
    reports: Mutex<VecDeque<DeliveryReport>>,
    fallback: DeliveryReport,
    delay: Option<Duration>,
    pub sent: Mutex<Vec<EmailPayload>>,
}

impl ScriptedProvider {
    pub fn always(report: DeliveryReport) -> Self {
        Self {
            reports: Mutex::new(VecDeque::new()),
            fallback: report,
            delay: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn then(self, report: DeliveryReport) -> Self {
        self.reports.lock().unwrap().push_back(report);
        self
    }

    pub fn sent(&self) -> Vec<EmailPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailProvider for ScriptedProvider {
    async fn send(&self, payload: &EmailPayload) -> DeliveryReport {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(payload.clone());
        let next = self.reports.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn deliverer(store: &EmailLogStore, provider: Arc<ScriptedProvider>) -> (Deliverer, Arc<MetricsService>) {
    let metrics = Arc::new(MetricsService::new().unwrap());
    let deliverer = Deliverer::new(
        store.clone(),
        provider,
        Arc::new(Templates::new().unwrap()),
        metrics.clone(),
    );
    (deliverer, metrics)
}
