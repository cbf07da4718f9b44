use chrono::{Datelike, Utc};
use handlebars::Handlebars;
use mailer_models::{EmailRequest, MailerError};
use rust_embed::RustEmbed;
use serde::Serialize;
use tracing::debug;

pub const INDEX_PAGE: &str = "pages/index";
pub const STATUS_PAGE: &str = "pages/status";
const EMAIL_PREFIX: &str = "emails/";

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Assets;

/// Handlebars registry holding every embedded `.hbs` file, keyed by its
/// path without the extension (`pages/index`, `emails/welcome`).
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, MailerError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);

        for path in Assets::iter() {
            let Some(name) = path.strip_suffix(".hbs") else {
                continue;
            };
            let file = Assets::get(&path).ok_or_else(|| MailerError::TemplateNotFound {
                name: name.to_string(),
            })?;
            let source = std::str::from_utf8(&file.data).map_err(|e| MailerError::TemplateError {
                reason: format!("{} is not valid UTF-8: {}", path, e),
            })?;
            registry
                .register_template_string(name, source)
                .map_err(|e| MailerError::TemplateError { reason: e.to_string() })?;
            debug!(template = %name, "Registered template");
        }

        Ok(Self { registry })
    }

    pub fn render_page<T: Serialize>(&self, name: &str, data: &T) -> Result<String, MailerError> {
        if !self.registry.has_template(name) {
            return Err(MailerError::TemplateNotFound { name: name.to_string() });
        }
        self.registry
            .render(name, data)
            .map_err(|e| MailerError::TemplateError { reason: e.to_string() })
    }

    pub fn has_email_template(&self, name: &str) -> bool {
        self.registry.has_template(&format!("{EMAIL_PREFIX}{name}"))
    }

    pub fn email_templates(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registry
            .get_templates()
            .keys()
            .filter_map(|k| k.strip_prefix(EMAIL_PREFIX).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    pub fn render_email(&self, name: &str, vars: &EmailVars) -> Result<String, MailerError> {
        if !self.has_email_template(name) {
            return Err(MailerError::TemplateNotFound { name: name.to_string() });
        }
        self.registry
            .render(&format!("{EMAIL_PREFIX}{name}"), vars)
            .map_err(|e| MailerError::TemplateError { reason: e.to_string() })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailVars {
    pub user_name: String,
    pub company_name: String,
    pub login_url: String,
    pub support_url: String,
    pub year: i32,
}

impl EmailVars {
    pub fn from_request(request: &EmailRequest) -> Self {
        let data = request.template_data.clone().unwrap_or_default();
        let user_name = if request.receiver_name.trim().is_empty() {
            "User".to_string()
        } else {
            request.receiver_name.clone()
        };

        Self {
            user_name,
            company_name: data.company_name.unwrap_or_else(|| "Our Company".to_string()),
            login_url: data.login_url.unwrap_or_else(|| "#".to_string()),
            support_url: data.support_url.unwrap_or_else(|| "#".to_string()),
            year: data.year.unwrap_or_else(|| Utc::now().year()),
        }
    }
}
