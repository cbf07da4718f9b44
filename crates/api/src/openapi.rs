use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::*;
use mailer_models::{
    EmailLogView, EmailRequest, EmailStatus, ErrorShape, HealthResponse, QueuedResponse, StatusPage, TemplateData,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        send_email,
        email_status,
        health,
        metrics,
    ),
    components(
        schemas(
            EmailRequest,
            TemplateData,
            QueuedResponse,
            StatusPage,
            EmailLogView,
            EmailStatus,
            ErrorShape,
            HealthResponse,
        )
    ),
    tags(
        (name = "email", description = "Email queueing and delivery log"),
        (name = "health", description = "Health and monitoring endpoints"),
    ),
    info(
        title = "Mailer Service API",
        description = "Queues transactional email for background delivery through MailerLite",
        version = "0.1.0",
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    )
)]
pub struct ApiDoc;

pub fn create_swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/openapi.json", ApiDoc::openapi())
        .config(
            utoipa_swagger_ui::Config::new(["/openapi.json"])
                .try_it_out_enabled(true)
                .display_request_duration(true),
        )
}

pub fn create_redoc() -> Redoc<'static, 'static, utoipa::openapi::OpenApi> {
    Redoc::with_url("/redoc", ApiDoc::openapi())
}
