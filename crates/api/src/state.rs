use mailer_control::{DeliveryQueue, EmailLogStore};
use mailer_metrics::MetricsService;
use mailer_models::Config;
use mailer_templates::Templates;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: EmailLogStore,
    pub queue: Arc<DeliveryQueue>,
    pub templates: Arc<Templates>,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: EmailLogStore,
        queue: Arc<DeliveryQueue>,
        templates: Arc<Templates>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            config,
            store,
            queue,
            templates,
            metrics,
        }
    }
}
