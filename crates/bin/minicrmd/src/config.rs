//! Daemon settings.
//!
//! Read from `minicrm.toml` when it exists, then patched with `MINICRM_*`
//! variables (and `RUST_LOG`). Missing keys fall back to defaults, so an
//! empty file and no file at all behave the same.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use minicrm_domain::id::TenantId;

const CONFIG_FILE: &str = "minicrm.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub webhook: WebhookConfig,
    pub automation: AutomationConfig,
}

/// `[server]`: where the HTTP API listens.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// `[database]`: sqlx connection string.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

/// `[logging]`: an `EnvFilter` directive list.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

/// `[webhook]`: outbound calls made by `webhook` actions.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub timeout_secs: u64,
}

/// `[automation]`: tenants whose rules run in this process.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub tenants: Vec<TenantId>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:minicrm.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "minicrmd=info,minicrm_app=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// Why the daemon could not assemble its settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("{name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

impl Config {
    /// Settings for this process: `minicrm.toml`, then the environment.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, when a variable holds an
    /// unusable value, or when the merged settings are inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::read(Path::new(CONFIG_FILE))?;
        config.merge_env(|name| std::env::var(name).ok())?;
        config.check()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Later variables win: `MINICRM_BIND` over `MINICRM_HOST`/`MINICRM_PORT`,
    /// `RUST_LOG` over `MINICRM_LOG`.
    fn merge_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(host) = var("MINICRM_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("MINICRM_PORT") {
            self.server.port = parse_port("MINICRM_PORT", &port)?;
        }
        if let Some(bind) = var("MINICRM_BIND") {
            let (host, port) = bind
                .rsplit_once(':')
                .ok_or_else(|| ConfigError::invalid("MINICRM_BIND", "expected host:port"))?;
            self.server.host = host.to_string();
            self.server.port = parse_port("MINICRM_BIND", port)?;
        }
        if let Some(url) = var("MINICRM_DATABASE_URL") {
            self.database.url = url;
        }
        for name in ["MINICRM_LOG", "RUST_LOG"] {
            if let Some(filter) = var(name) {
                self.logging.filter = filter;
            }
        }
        if let Some(secs) = var("MINICRM_WEBHOOK_TIMEOUT_SECS") {
            self.webhook.timeout_secs = secs.trim().parse().map_err(|_| {
                ConfigError::invalid(
                    "MINICRM_WEBHOOK_TIMEOUT_SECS",
                    format!("`{secs}` is not a number of seconds"),
                )
            })?;
        }
        if let Some(tenants) = var("MINICRM_TENANTS") {
            self.automation.tenants = parse_tenants(&tenants)?;
        }
        Ok(())
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "must not be 0"));
        }
        if self.webhook.timeout_secs == 0 {
            return Err(ConfigError::invalid("webhook.timeout_secs", "must not be 0"));
        }
        Ok(())
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook.timeout_secs)
    }

    /// Configured tenants, first occurrence kept.
    #[must_use]
    pub fn tenants(&self) -> Vec<TenantId> {
        let mut tenants: Vec<TenantId> = Vec::with_capacity(self.automation.tenants.len());
        for tenant in &self.automation.tenants {
            if !tenants.contains(tenant) {
                tenants.push(*tenant);
            }
        }
        tenants
    }
}

fn parse_port(name: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(name, format!("`{raw}` is not a port")))
}

fn parse_tenants(raw: &str) -> Result<Vec<TenantId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            TenantId::from_str(item).map_err(|err| {
                ConfigError::invalid(
                    "MINICRM_TENANTS",
                    format!("`{item}` is not a tenant id: {err}"),
                )
            })
        })
        .collect()
}
