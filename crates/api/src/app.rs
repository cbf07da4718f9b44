use mailer_control::{connect_pool, Deliverer, DeliveryQueue, EmailLogStore};
use mailer_metrics::{MetricsService, TracingService};
use mailer_models::Config;
use mailer_provider::{EmailProvider, MailerLiteClient};
use mailer_templates::Templates;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{build_app, AppState};

pub const STALE_PENDING_REASON: &str = "Delivery interrupted by service restart";

/// Everything the HTTP server needs, wired from a [`Config`].
pub struct Application {
    state: AppState,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let provider: Arc<dyn EmailProvider> = Arc::new(MailerLiteClient::new(&config.mailerlite)?);
        Self::build_with_provider(config, provider).await
    }

    pub async fn build_with_provider(config: Config, provider: Arc<dyn EmailProvider>) -> anyhow::Result<Self> {
        config.validate()?;
        prepare_data_dir(&config);

        let pool = connect_pool(&config.data.db_url).await?;
        info!("Database connected");

        let store = EmailLogStore::new(pool).await?;
        let stale = store.fail_stale_pending(STALE_PENDING_REASON).await?;
        TracingService::log_stale_pending(stale);

        let templates = Arc::new(Templates::new()?);
        let metrics = Arc::new(MetricsService::new()?);

        let deliverer = Deliverer::new(store.clone(), provider.clone(), templates.clone(), metrics.clone());
        let queue = Arc::new(DeliveryQueue::start(
            deliverer,
            config.delivery.workers,
            config.delivery.queue_capacity,
        ));
        info!("Using email provider: {}", provider.name());

        Ok(Self {
            state: AppState::new(config, store, queue, templates, metrics),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serves until `shutdown` resolves, then drains the delivery queue.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let grace = Duration::from_secs(self.state.config.delivery.shutdown_grace_secs);
        let queue = self.state.queue.clone();
        let app = build_app(self.state);

        info!("Mailer API listening on {}", listener.local_addr()?);
        axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

        info!("HTTP server stopped, draining delivery queue");
        queue.shutdown(grace).await;
        Ok(())
    }
}

fn prepare_data_dir(config: &Config) {
    if !config.data.dir.is_empty() {
        if let Err(e) = std::fs::create_dir_all(&config.data.dir) {
            warn!("Failed to create data directory {}: {}", config.data.dir, e);
        }
    }

    if let Some(parent) = config.sqlite_path().and_then(|p| Path::new(p).parent()) {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create DB parent directory {:?}: {}", parent, e);
            }
        }
    }
}
