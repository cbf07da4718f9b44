use anyhow::Result;
use async_trait::async_trait;
use mailer_api::{AppState, Application};
use mailer_models::{Config, EmailPayload};
use mailer_provider::{DeliveryReport, EmailProvider};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A mailer server running in-process on an ephemeral port.
pub struct TestApp {
    pub base_url: String,
    pub state: AppState,
    pub data_dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<()>>,
}

impl TestApp {
    /// Triggers graceful shutdown and waits for the queue to drain.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await?
    }
}

#[derive(Debug, Default)]
pub struct ConfigOverride {
    pub mailerlite_base_url: Option<String>,
    pub mailerlite_timeout_secs: Option<u64>,
    pub workers: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub per_page: Option<i64>,
}

fn test_config(data_dir: &TempDir, config_override: Option<ConfigOverride>) -> Config {
    let data_path = data_dir.path().to_string_lossy();

    let mut config = Config::default();
    config.server.bind = "127.0.0.1".to_string();
    config.server.port = 0;
    config.data.dir = data_path.to_string();
    config.data.db_url = format!("sqlite://{}/mailer.db", data_path);
    config.mailerlite.api_key = "test-api-key".to_string();
    config.delivery.shutdown_grace_secs = 5;

    if let Some(o) = config_override {
        if let Some(url) = o.mailerlite_base_url {
            config.mailerlite.base_url = url;
        }
        if let Some(secs) = o.mailerlite_timeout_secs {
            config.mailerlite.timeout_secs = secs;
        }
        if let Some(workers) = o.workers {
            config.delivery.workers = workers;
        }
        if let Some(capacity) = o.queue_capacity {
            config.delivery.queue_capacity = capacity;
        }
        if let Some(per_page) = o.per_page {
            config.delivery.per_page = per_page;
        }
    }

    config
}

/// Spawns a server that talks to MailerLite at the configured base URL.
pub async fn spawn_app(config_override: Option<ConfigOverride>) -> Result<TestApp> {
    let data_dir = tempfile::tempdir()?;
    let config = test_config(&data_dir, config_override);
    let app = Application::build(config).await?;
    serve(app, data_dir).await
}

/// Spawns a server with a caller-supplied provider.
pub async fn spawn_app_with_provider(
    config_override: Option<ConfigOverride>,
    provider: Arc<dyn EmailProvider>,
) -> Result<TestApp> {
    let data_dir = tempfile::tempdir()?;
    let config = test_config(&data_dir, config_override);
    let app = Application::build_with_provider(config, provider).await?;
    serve(app, data_dir).await
}

async fn serve(app: Application, data_dir: TempDir) -> Result<TestApp> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let state = app.state().clone();

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(app.run(listener, async move {
        let _ = rx.await;
    }));

    Ok(TestApp {
        base_url,
        state,
        data_dir,
        shutdown: Some(tx),
        handle,
    })
}

/// Provider that records every payload and answers with a fixed report.
pub struct RecordingProvider {
    status_code: u16,
    body: String,
    sent: Mutex<Vec<EmailPayload>>,
}

impl RecordingProvider {
    pub fn accepting() -> Self {
        Self::responding(202, r#"{"message":"accepted"}"#)
    }

    pub fn responding(status_code: u16, body: &str) -> Self {
        Self {
            status_code,
            body: body.to_string(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<EmailPayload> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailProvider for RecordingProvider {
    async fn send(&self, payload: &EmailPayload) -> DeliveryReport {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(payload.clone());
        }
        DeliveryReport::new(self.status_code, &self.body)
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
