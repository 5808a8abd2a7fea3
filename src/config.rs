//! Application configuration loaded from environment variables.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::frames::FrameLayout;

/// Application configuration loaded from environment variables.
///
/// Built once at startup and shared read-only; nothing mutates it afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Mixpanel Credentials ===
    /// Mixpanel project id.
    pub mixpanel_project_id: String,

    /// Service-account username.
    pub mixpanel_service_account_username: String,

    /// Service-account secret.
    pub mixpanel_service_account_secret: String,

    /// Saved Insights report whose series feed the analytics slots.
    pub mixpanel_bookmark_id: String,

    /// Query API base URL.
    #[serde(default = "default_mixpanel_url")]
    pub mixpanel_api_url: String,

    // === GitHub ===
    /// API token. Repository slots are disabled without it.
    #[serde(default)]
    pub github_token: Option<String>,

    /// Repository owner.
    #[serde(default = "default_github_owner")]
    pub github_owner: String,

    /// Repository name.
    #[serde(default = "default_github_repo")]
    pub github_repo: String,

    /// REST API base URL.
    #[serde(default = "default_github_url")]
    pub github_api_url: String,

    // === Display ===
    /// Frame layout, e.g. `dau=i1,wau=i2,github:stars=i3`.
    #[serde(default = "default_frames")]
    pub frames: String,

    // === HTTP Client ===
    /// Outbound request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Server Configuration ===
    /// HTTP server port for the device-facing endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Start the Prometheus exporter.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Prometheus exporter port.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_mixpanel_url() -> String {
    "https://mixpanel.com/api/query".to_string()
}

fn default_github_owner() -> String {
    "zenml-io".to_string()
}

fn default_github_repo() -> String {
    "zenml".to_string()
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

fn default_frames() -> String {
    "dau=i1,wau=i2,github:stars=i3".to_string()
}

fn default_http_timeout_ms() -> u64 {
    5_000
}

fn default_port() -> u16 {
    8000
}

fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load and validate configuration from explicit key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("MIXPANEL_PROJECT_ID", &self.mixpanel_project_id),
            (
                "MIXPANEL_SERVICE_ACCOUNT_USERNAME",
                &self.mixpanel_service_account_username,
            ),
            (
                "MIXPANEL_SERVICE_ACCOUNT_SECRET",
                &self.mixpanel_service_account_secret,
            ),
            ("MIXPANEL_BOOKMARK_ID", &self.mixpanel_bookmark_id),
            ("GITHUB_OWNER", &self.github_owner),
            ("GITHUB_REPO", &self.github_repo),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }

        validate_base_url("MIXPANEL_API_URL", &self.mixpanel_api_url)?;
        validate_base_url("GITHUB_API_URL", &self.github_api_url)?;

        if self.http_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "HTTP_TIMEOUT_MS",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.metrics_enabled && self.metrics_port == self.port {
            return Err(ConfigError::Invalid {
                field: "METRICS_PORT",
                reason: format!("must differ from PORT ({})", self.port),
            });
        }

        self.frame_layout()?;

        Ok(())
    }

    /// Parse the frame layout.
    pub fn frame_layout(&self) -> Result<FrameLayout, ConfigError> {
        self.frames.parse()
    }

    /// GitHub token, treating an empty value as absent.
    pub fn github_token(&self) -> Option<&str> {
        self.github_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Outbound request timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

fn validate_base_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    Ok(())
}
