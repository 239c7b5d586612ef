use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tracing::info;

/// Webhook the analysis relay forwards to when `ANALYSIS_WEBHOOK_URL` is unset.
pub const DEFAULT_WEBHOOK_URL: &str =
    "https://primary-production-b1c8.up.railway.app/webhook-test/stockartaipromptboxhandler";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SOURCE_TAG: &str = "stockart-ui";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a valid port number, got '{value}'")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must be a whole number of milliseconds, got '{value}'")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("{var} is not a valid URL ('{value}'): {reason}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Operating mode. Only `NODE_ENV=production` selects production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Production,
    Development,
}

impl AppMode {
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("production") => AppMode::Production,
            _ => AppMode::Development,
        }
    }

    /// Whether raw error text may be returned to clients.
    pub fn exposes_details(self) -> bool {
        self != AppMode::Production
    }
}

/// Everything the relay needs to reach the analysis webhook.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub webhook_url: Url,
    pub timeout: Duration,
    pub source_tag: String,
}

impl RelayConfig {
    pub fn new(webhook_url: Url) -> Self {
        Self {
            webhook_url,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `scheme://host[:port]` of the webhook, used for the CSP connect-src.
    pub fn webhook_origin(&self) -> String {
        self.webhook_url.origin().ascii_serialization()
    }

    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("ANALYSIS_WEBHOOK_URL")
            .unwrap_or_else(|| DEFAULT_WEBHOOK_URL.to_string());
        let webhook_url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidUrl {
            var: "ANALYSIS_WEBHOOK_URL",
            value: raw_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(webhook_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                var: "ANALYSIS_WEBHOOK_URL",
                value: raw_url,
                reason: "scheme must be http or https".to_string(),
            });
        }

        let timeout_ms = match lookup("ANALYSIS_TIMEOUT_MS") {
            Some(v) => v.parse::<u64>().map_err(|_| ConfigError::InvalidTimeout {
                var: "ANALYSIS_TIMEOUT_MS",
                value: v.clone(),
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            webhook_url,
            timeout: Duration::from_millis(timeout_ms),
            source_tag: lookup("ANALYSIS_SOURCE_TAG")
                .unwrap_or_else(|| DEFAULT_SOURCE_TAG.to_string()),
        })
    }
}

/// Process-level settings for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub mode: AppMode,
    pub public_dir: PathBuf,
    pub site_root: PathBuf,
    pub relay: RelayConfig,
}

impl ServerConfig {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = Self::from_lookup(|key| std::env::var(key).ok())?;
        info!(
            port = cfg.port,
            mode = ?cfg.mode,
            webhook = %cfg.relay.webhook_url,
            timeout_ms = cfg.relay.timeout.as_millis() as u64,
            "configuration loaded"
        );
        Ok(cfg)
    }

    /// Builds the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match lookup("PORT") {
            Some(v) => v.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                var: "PORT",
                value: v.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            mode: AppMode::from_env_value(lookup("NODE_ENV").as_deref()),
            public_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            site_root: lookup("SITE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            relay: RelayConfig::from_lookup(&lookup)?,
        })
    }

    pub fn index_file(&self) -> PathBuf {
        self.site_root.join("index.html")
    }
}
