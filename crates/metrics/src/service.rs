use mailer_models::MailerError;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

pub struct MetricsService {
    registry: Registry,
    emails_queued_total: Counter,
    emails_sent_total: Counter,
    emails_failed_total: Counter,
    provider_responses_total: IntCounterVec,
    delivery_duration_ms: Histogram,
}

fn internal(e: impl std::fmt::Display) -> MailerError {
    MailerError::InternalError { reason: e.to_string() }
}

impl MetricsService {
    pub fn new() -> Result<Self, MailerError> {
        let registry = Registry::new();

        let emails_queued_total = Counter::new(
            "mailer_emails_queued_total",
            "Total number of emails accepted and queued for delivery",
        )
        .map_err(internal)?;

        let emails_sent_total = Counter::new(
            "mailer_emails_sent_total",
            "Total number of emails the provider accepted",
        )
        .map_err(internal)?;

        let emails_failed_total = Counter::new(
            "mailer_emails_failed_total",
            "Total number of emails that could not be delivered",
        )
        .map_err(internal)?;

        let provider_responses_total = IntCounterVec::new(
            Opts::new(
                "mailer_provider_responses_total",
                "Provider responses by HTTP status code",
            ),
            &["status_code"],
        )
        .map_err(internal)?;

        let delivery_duration_ms = Histogram::with_opts(
            HistogramOpts::new(
                "mailer_delivery_duration_ms",
                "Time spent rendering and sending an email in milliseconds",
            )
            .buckets(vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0]),
        )
        .map_err(internal)?;

        registry.register(Box::new(emails_queued_total.clone())).map_err(internal)?;
        registry.register(Box::new(emails_sent_total.clone())).map_err(internal)?;
        registry.register(Box::new(emails_failed_total.clone())).map_err(internal)?;
        registry.register(Box::new(provider_responses_total.clone())).map_err(internal)?;
        registry.register(Box::new(delivery_duration_ms.clone())).map_err(internal)?;

        Ok(Self {
            registry,
            emails_queued_total,
            emails_sent_total,
            emails_failed_total,
            provider_responses_total,
            delivery_duration_ms,
        })
    }

    pub fn record_queued(&self) {
        self.emails_queued_total.inc();
    }

    pub fn record_sent(&self) {
        self.emails_sent_total.inc();
    }

    pub fn record_failed(&self) {
        self.emails_failed_total.inc();
    }

    pub fn record_provider_response(&self, status_code: u16) {
        self.provider_responses_total
            .with_label_values(&[&status_code.to_string()])
            .inc();
    }

    pub fn record_duration(&self, duration_ms: f64) {
        self.delivery_duration_ms.observe(duration_ms);
    }

    pub fn get_prometheus_metrics(&self) -> Result<String, MailerError> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder.encode(&metric_families, &mut buffer).map_err(internal)?;

        String::from_utf8(buffer).map_err(internal)
    }
}
