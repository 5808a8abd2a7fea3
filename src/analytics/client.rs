//! Mixpanel query API client.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::UpstreamError;
use crate::telemetry::{Service, UpstreamTimer};
use crate::utils::http_client;

use super::types::InsightsResponse;
use super::{AnalyticsMetric, AnalyticsMetrics, AnalyticsSource};

/// Mixpanel Insights client authenticated with a service account.
#[derive(Debug, Clone)]
pub struct MixpanelClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Query API base URL.
    api_url: String,
    /// Project id.
    project_id: String,
    /// Saved report id.
    bookmark_id: String,
    /// Service-account username.
    username: String,
    /// Service-account secret.
    secret: String,
}

impl MixpanelClient {
    /// Create a new client from config.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: http_client(config.http_timeout())?,
            api_url: config.mixpanel_api_url.trim_end_matches('/').to_string(),
            project_id: config.mixpanel_project_id.clone(),
            bookmark_id: config.mixpanel_bookmark_id.clone(),
            username: config.mixpanel_service_account_username.clone(),
            secret: config.mixpanel_service_account_secret.clone(),
        })
    }

    /// Insights endpoint URL.
    fn insights_url(&self) -> String {
        format!("{}/insights", self.api_url)
    }

    /// Fetch the saved Insights report.
    #[instrument(skip(self), fields(project_id = %self.project_id, bookmark_id = %self.bookmark_id))]
    pub async fn get_insights(&self) -> Result<InsightsResponse, UpstreamError> {
        let _timer = UpstreamTimer::new(Service::Mixpanel);
        let url = self.insights_url();

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.secret))
            .query(&[
                ("project_id", self.project_id.as_str()),
                ("bookmark_id", self.bookmark_id.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::status(Service::Mixpanel, status.as_u16(), &body));
        }

        let report: InsightsResponse =
            response.json().await.map_err(|e| UpstreamError::Malformed {
                service: Service::Mixpanel,
                reason: format!("failed to parse insights report: {}", e),
            })?;

        let range = report.date_range.as_ref();
        debug!(
            computed_at = ?report.computed_at,
            from = ?range.and_then(|r| r.from_date.as_deref()),
            to = ?range.and_then(|r| r.to_date.as_deref()),
            "Fetched insights report"
        );

        Ok(report)
    }
}

#[async_trait]
impl AnalyticsSource for MixpanelClient {
    async fn fetch_metrics(
        &self,
        metrics: &[AnalyticsMetric],
    ) -> Result<AnalyticsMetrics, UpstreamError> {
        self.get_insights().await?.reduce(metrics)
    }
}
