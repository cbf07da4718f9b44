use futures::future::join_all;
use mailer_metrics::{MetricsService, TracingService};
use mailer_models::{EmailRequest, EmailStatus, MailerError};
use mailer_provider::{DeliveryReport, EmailProvider};
use mailer_templates::{EmailVars, Templates};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::store::EmailLogStore;

#[derive(Clone, Debug)]
pub struct DeliveryJob {
    pub email_id: i64,
    pub request: EmailRequest,
}

/// Renders, sends and records the outcome of one job.
#[derive(Clone)]
pub struct Deliverer {
    store: EmailLogStore,
    provider: Arc<dyn EmailProvider>,
    templates: Arc<Templates>,
    metrics: Arc<MetricsService>,
}

impl Deliverer {
    pub fn new(
        store: EmailLogStore,
        provider: Arc<dyn EmailProvider>,
        templates: Arc<Templates>,
        metrics: Arc<MetricsService>,
    ) -> Self {
        Self {
            store,
            provider,
            templates,
            metrics,
        }
    }

    /// Returns the final status written to the log, or `None` when the log
    /// row no longer exists.
    #[instrument(skip(self, job), fields(email_id = job.email_id))]
    pub async fn deliver(&self, job: &DeliveryJob) -> Result<Option<EmailStatus>, MailerError> {
        match self.store.get(job.email_id).await {
            Ok(_) => {}
            Err(MailerError::EmailLogNotFound { id }) => {
                warn!("Email log {} disappeared before delivery, dropping job", id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        let started = Instant::now();
        let (status, response, status_code) = match self.render_and_send(&job.request).await {
            Ok(report) => {
                self.metrics.record_provider_response(report.status_code);
                let status = if report.is_success() {
                    EmailStatus::Sent
                } else {
                    EmailStatus::Failed
                };
                (status, report.body, report.status_code)
            }
            Err(e) => {
                TracingService::log_delivery_error(job.email_id, &e.to_string());
                (EmailStatus::Failed, e.to_string(), 0)
            }
        };
        let elapsed = started.elapsed();

        self.store.update_status(job.email_id, status, &response).await?;

        self.metrics.record_duration(elapsed.as_secs_f64() * 1000.0);
        match status {
            EmailStatus::Sent => self.metrics.record_sent(),
            _ => self.metrics.record_failed(),
        }
        TracingService::log_delivery_finished(job.email_id, status, status_code, duration_ms(elapsed));

        Ok(Some(status))
    }

    async fn render_and_send(&self, request: &EmailRequest) -> Result<DeliveryReport, MailerError> {
        let html = match &request.template {
            Some(name) => self.templates.render_email(name, &EmailVars::from_request(request))?,
            None => request.content.clone(),
        };

        let payload = request.to_payload(html);
        Ok(self.provider.send(&payload).await)
    }

    pub fn metrics(&self) -> &Arc<MetricsService> {
        &self.metrics
    }
}

/// Bounded job queue drained by a fixed pool of worker tasks.
pub struct DeliveryQueue {
    tx: RwLock<Option<mpsc::Sender<DeliveryJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    metrics: Arc<MetricsService>,
}

impl DeliveryQueue {
    pub fn start(deliverer: Deliverer, workers: usize, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let metrics = deliverer.metrics().clone();

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let rx = rx.clone();
                let deliverer = deliverer.clone();
                tokio::spawn(run_worker(worker_id, rx, deliverer))
            })
            .collect();

        info!("Delivery queue started with {} workers (capacity {})", workers.max(1), capacity.max(1));

        Self {
            tx: RwLock::new(Some(tx)),
            workers: Mutex::new(handles),
            metrics,
        }
    }

    /// Waits for queue capacity. Fails once the queue has been closed.
    pub async fn enqueue(&self, job: DeliveryJob) -> Result<(), MailerError> {
        let tx = self
            .tx
            .read()
            .map_err(|e| MailerError::InternalError { reason: e.to_string() })?
            .clone()
            .ok_or(MailerError::QueueUnavailable)?;

        tx.send(job).await.map_err(|_| MailerError::QueueUnavailable)?;
        self.metrics.record_queued();
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.tx.read().map(|tx| tx.is_some()).unwrap_or(false)
    }

    /// Stops accepting jobs; workers finish whatever is already buffered.
    pub fn close(&self) {
        if let Ok(mut tx) = self.tx.write() {
            tx.take();
        }
    }

    /// Closes the queue and waits up to `grace` for workers to drain it.
    /// Returns `true` when every worker exited in time.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.close();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock().await);

        let drained = tokio::time::timeout(grace, async {
            for result in join_all(handles).await {
                if let Err(e) = result {
                    error!("Delivery worker panicked: {}", e);
                }
            }
        })
        .await;

        match drained {
            Ok(()) => {
                info!("Delivery queue drained");
                true
            }
            Err(_) => {
                warn!("Delivery queue did not drain within {:?}", grace);
                false
            }
        }
    }
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

async fn run_worker(worker_id: usize, rx: Arc<Mutex<mpsc::Receiver<DeliveryJob>>>, deliverer: Deliverer) {
    info!("Delivery worker {} started", worker_id);

    loop {
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else { break };

        if let Err(e) = deliverer.deliver(&job).await {
            error!(email_id = job.email_id, "Failed to record delivery outcome: {}", e);
        }
    }

    info!("Delivery worker {} exiting", worker_id);
}
