use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
};
use mailer_control::DeliveryJob;
use mailer_metrics::TracingService;
use mailer_models::{
    EmailLogView, EmailRequest, EmailStatus, ErrorShape, HealthResponse, MailerError, QueuedResponse, StatusPage,
    StatusQuery,
};
use mailer_templates::{INDEX_PAGE, STATUS_PAGE};
use serde_json::json;
use tracing::{error, info, instrument};

use crate::AppState;

pub type ApiError = (StatusCode, Json<ErrorShape>);

pub fn error_response(e: &MailerError) -> ApiError {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(e.to_error_shape()))
}

const QUEUE_UNAVAILABLE_RESPONSE: &str = "Delivery queue unavailable; email was not sent";

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let links = [
        ("API Docs (Swagger)", "/docs"),
        ("API Docs (ReDoc)", "/redoc"),
        ("OpenAPI Document", "/openapi.json"),
        ("Send Email (POST)", "/send-email"),
        ("Email Status UI", "/status"),
        ("Email Status API", "/api/status"),
        ("Health Check", "/health"),
        ("Metrics", "/metrics"),
    ]
    .iter()
    .map(|(name, url)| json!({ "name": name, "url": url }))
    .collect::<Vec<_>>();

    state
        .templates
        .render_page(
            INDEX_PAGE,
            &json!({
                "title": "Mailer Service",
                "version": env!("CARGO_PKG_VERSION"),
                "links": links,
            }),
        )
        .map(Html)
        .map_err(|e| {
            error!("Failed to render index page: {}", e);
            error_response(&e)
        })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Queue an email for sending in the background.
///
/// Returns as soon as the log entry is stored and the job is queued.
#[utoipa::path(
    post,
    path = "/send-email",
    tag = "email",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Email queued", body = QueuedResponse),
        (status = 422, description = "Invalid request", body = ErrorShape),
        (status = 503, description = "Delivery queue unavailable", body = ErrorShape)
    )
)]
#[instrument(skip(state, payload))]
pub async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<QueuedResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        let shape = ErrorShape {
            error_message: rejection.body_text(),
            error_type: "ValidationError".to_string(),
        };
        (rejection.status(), Json(shape))
    })?;

    request.validate().map_err(|e| error_response(&e))?;

    if let Some(template) = &request.template {
        if !state.templates.has_email_template(template) {
            return Err(error_response(&MailerError::TemplateNotFound { name: template.clone() }));
        }
    }

    let log = state.store.create_pending(&request).await.map_err(|e| {
        error!("Failed to create email log: {}", e);
        error_response(&e)
    })?;

    TracingService::log_email_queued(log.id, &log.receiver_email, &log.subject);

    let job = DeliveryJob {
        email_id: log.id,
        request,
    };
    if let Err(e) = state.queue.enqueue(job).await {
        error!("Failed to enqueue email {}: {}", log.id, e);
        if let Err(update_err) = state
            .store
            .update_status(log.id, EmailStatus::Failed, QUEUE_UNAVAILABLE_RESPONSE)
            .await
        {
            error!("Failed to mark email {} as failed: {}", log.id, update_err);
        }
        state.metrics.record_failed();
        return Err(error_response(&e));
    }

    Ok(Json(QueuedResponse::queued(log.id)))
}

#[instrument(skip(state))]
pub async fn status_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    state
        .templates
        .render_page(
            STATUS_PAGE,
            &json!({
                "title": "Email Status",
                "api_url": "/api/status",
            }),
        )
        .map(Html)
        .map_err(|e| {
            error!("Failed to render status page: {}", e);
            error_response(&e)
        })
}

/// Paginated email log, newest first.
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "email",
    params(StatusQuery),
    responses(
        (status = 200, description = "One page of the email log", body = StatusPage),
        (status = 400, description = "Malformed query string")
    )
)]
#[instrument(skip(state))]
pub async fn email_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusPage>, ApiError> {
    let page = query.page();
    let per_page = state.config.delivery.per_page;

    let (total, logs) = state
        .store
        .list(page, per_page, query.status_filter())
        .await
        .map_err(|e| {
            error!("Failed to list email logs: {}", e);
            error_response(&e)
        })?;

    info!("Listed {} of {} email logs (page {})", logs.len(), total, page);

    Ok(Json(StatusPage {
        total,
        page,
        per_page,
        data: logs.into_iter().map(EmailLogView::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses((status = 200, description = "Prometheus text exposition", body = String))
)]
#[instrument(skip(state))]
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    match state.metrics.get_prometheus_metrics() {
        Ok(metrics) => Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], metrics)),
        Err(e) => {
            error!("Failed to get metrics: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
