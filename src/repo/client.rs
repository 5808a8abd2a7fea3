//! GitHub REST API client.

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::UpstreamError;
use crate::telemetry::{self, Service, UpstreamTimer};
use crate::utils::http_client;

use super::{RepoSource, RepoStats, RepoStatus, RepositoryResponse};

/// User agent sent to GitHub, which rejects requests without one.
const USER_AGENT: &str = concat!("lametric-relay/", env!("CARGO_PKG_VERSION"));

/// GitHub repository stats client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// REST API base URL.
    api_url: String,
    /// API token; `None` disables the integration.
    token: Option<String>,
}

impl GithubClient {
    /// Create a new client from config.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: http_client(config.http_timeout())?,
            api_url: config.github_api_url.trim_end_matches('/').to_string(),
            token: config.github_token().map(str::to_string),
        })
    }

    /// Whether a token is configured.
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Fetch repository stats, surfacing errors.
    #[instrument(skip(self, token))]
    async fn get_repository(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<RepoStats, UpstreamError> {
        let _timer = UpstreamTimer::new(Service::Github);
        let url = format!("{}/repos/{}/{}", self.api_url, owner, repo);

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::status(Service::Github, status.as_u16(), &body));
        }

        let payload: RepositoryResponse =
            response.json().await.map_err(|e| UpstreamError::Malformed {
                service: Service::Github,
                reason: format!("failed to parse repository: {}", e),
            })?;

        debug!(
            full_name = payload.full_name.as_deref().unwrap_or("unknown"),
            "Repository payload received"
        );

        payload.stats().ok_or_else(|| UpstreamError::Malformed {
            service: Service::Github,
            reason: "repository payload is missing a count".to_string(),
        })
    }
}

#[async_trait]
impl RepoSource for GithubClient {
    async fn fetch_repo_stats(&self, owner: &str, repo: &str) -> RepoStatus {
        let Some(token) = self.token.as_deref() else {
            debug!("GitHub token not configured, repository frames disabled");
            return RepoStatus::Disabled;
        };

        match self.get_repository(token, owner, repo).await {
            Ok(stats) => {
                debug!(stars = stats.stars, forks = stats.forks, "Fetched repository stats");
                RepoStatus::Available(stats)
            }
            Err(e) => {
                warn!(owner, repo, error = %e, "Failed to fetch repository stats");
                telemetry::inc_upstream_errors(Service::Github);
                RepoStatus::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(token: Option<&str>) -> Config {
        let mut vars: Vec<(String, String)> = [
            ("MIXPANEL_PROJECT_ID", "12345"),
            ("MIXPANEL_SERVICE_ACCOUNT_USERNAME", "relay.sa"),
            ("MIXPANEL_SERVICE_ACCOUNT_SECRET", "s3cret"),
            ("MIXPANEL_BOOKMARK_ID", "67890"),
            ("GITHUB_API_URL", "http://127.0.0.1:9"),
            ("HTTP_TIMEOUT_MS", "500"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        if let Some(token) = token {
            vars.push(("GITHUB_TOKEN".to_string(), token.to_string()));
        }
        Config::from_vars(vars).unwrap()
    }

    #[tokio::test]
    async fn disabled_without_token() {
        let client = GithubClient::new(&test_config(None)).unwrap();
        assert!(!client.is_enabled());
        assert_eq!(
            client.fetch_repo_stats("zenml-io", "zenml").await,
            RepoStatus::Disabled
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable_not_an_error() {
        let client = GithubClient::new(&test_config(Some("ghp_test"))).unwrap();
        assert!(client.is_enabled());
        assert_eq!(
            client.fetch_repo_stats("zenml-io", "zenml").await,
            RepoStatus::Unavailable
        );
    }
}
