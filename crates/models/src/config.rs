use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::MailerError;

pub const DEFAULT_CONFIG_PATH: &str = "config/mailer.toml";
pub const DEFAULT_PORT: u16 = 3000;
pub const MAILERLITE_SEND_URL: &str = "https://connect.mailerlite.com/api/email/send";

/// Top-level sections a `MAILER_SECTION__KEY` variable may target. Anything
/// else under the prefix (`MAILER_CONFIG`, orchestrator-injected
/// `MAILER_PORT`/`MAILER_SERVICE_HOST`) is not configuration.
const ENV_SECTIONS: &[&str] = &["server", "data", "mailerlite", "delivery"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub mailerlite: MailerLiteConfig,
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub max_request_body_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub dir: String,
    pub db_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MailerLiteConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub per_page: i64,
    pub shutdown_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: DEFAULT_PORT,
                max_request_body_size_mb: 10,
            },
            data: DataConfig {
                dir: "data".to_string(),
                db_url: "sqlite://data/mailer.db".to_string(),
            },
            mailerlite: MailerLiteConfig {
                api_key: "".to_string(),
                base_url: MAILERLITE_SEND_URL.to_string(),
                timeout_secs: 30,
            },
            delivery: DeliveryConfig {
                workers: 4,
                queue_capacity: 1024,
                per_page: 10,
                shutdown_grace_secs: 10,
            },
        }
    }
}

impl Config {
    /// Defaults, then the TOML file at `path` (if present), then
    /// `MAILER_SECTION__KEY` environment overrides.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("MAILER_").split("__").filter(|key| {
                key.as_str()
                    .split_once('.')
                    .map_or(false, |(section, _)| {
                        ENV_SECTIONS.iter().any(|s| section.eq_ignore_ascii_case(s))
                    })
            }))
    }

    /// Full load used by the server binary: the layered figment plus the
    /// plain deployment variables (`PORT`, `DATABASE_URL`, `MAILERLITE_API_KEY`).
    pub fn load() -> Result<Self, MailerError> {
        let path = std::env::var("MAILER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config: Config = Self::figment(&path)
            .extract()
            .map_err(|e| MailerError::ConfigError { reason: e.to_string() })?;
        config.apply_deployment_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_deployment_env<F>(&mut self, lookup: F) -> Result<(), MailerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            self.server.port = port.trim().parse::<u16>().map_err(|_| MailerError::ConfigError {
                reason: format!("PORT must be a valid TCP port, got {:?}", port),
            })?;
        }
        if let Some(db_url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.data.db_url = db_url;
        }
        if let Some(api_key) = lookup("MAILERLITE_API_KEY").filter(|v| !v.is_empty()) {
            self.mailerlite.api_key = api_key;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), MailerError> {
        if self.delivery.workers == 0 {
            return Err(MailerError::ConfigError {
                reason: "delivery.workers must be at least 1".to_string(),
            });
        }
        if self.delivery.queue_capacity == 0 {
            return Err(MailerError::ConfigError {
                reason: "delivery.queue_capacity must be at least 1".to_string(),
            });
        }
        if self.delivery.per_page < 1 {
            return Err(MailerError::ConfigError {
                reason: "delivery.per_page must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    /// Filesystem path of the SQLite database, if `db_url` points at a file.
    pub fn sqlite_path(&self) -> Option<&str> {
        let path = self
            .data
            .db_url
            .strip_prefix("sqlite://")
            .or_else(|| self.data.db_url.strip_prefix("sqlite:"))?;
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() || path == ":memory:" {
            None
        } else {
            Some(path)
        }
    }
}
