//! HTTP API handlers.

use std::fmt;
use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::analytics::{AnalyticsMetrics, AnalyticsSource, MixpanelClient};
use crate::config::Config;
use crate::error::Result;
use crate::frames::{format_frames, FrameLayout, FrameResponse};
use crate::repo::{GithubClient, RepoSource, RepoStatus};
use crate::telemetry::{self, Service};

/// Repository whose stats feed the repo slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    /// Owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,
}

/// Application state shared with handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Analytics upstream.
    pub analytics: Arc<dyn AnalyticsSource>,
    /// Repository upstream.
    pub repo: Arc<dyn RepoSource>,
    /// Fixed frame layout.
    pub layout: Arc<FrameLayout>,
    /// Repository to report on.
    pub target: Arc<RepoTarget>,
}

impl AppState {
    /// Create state from explicit parts.
    pub fn new(
        analytics: Arc<dyn AnalyticsSource>,
        repo: Arc<dyn RepoSource>,
        layout: FrameLayout,
        target: RepoTarget,
    ) -> Self {
        Self {
            analytics,
            repo,
            layout: Arc::new(layout),
            target: Arc::new(target),
        }
    }

    /// Wire the real Mixpanel and GitHub clients from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let github = GithubClient::new(config)?;
        if !github.is_enabled() {
            info!("GITHUB_TOKEN not set, repository slots will show OFF");
        }

        Ok(Self::new(
            Arc::new(MixpanelClient::new(config)?),
            Arc::new(github),
            config.frame_layout()?,
            RepoTarget {
                owner: config.github_owner.clone(),
                name: config.github_repo.clone(),
            },
        ))
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("layout", &self.layout)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Liveness handler - always returns 200, never calls upstream.
pub async fn health() -> impl IntoResponse {
    telemetry::inc_requests("/");
    Json(HealthResponse { status: "ok" })
}

/// Device polling handler - always returns 200 with one frame per slot.
pub async fn frames(State(state): State<AppState>) -> Json<FrameResponse> {
    telemetry::inc_requests("/metrics");
    Json(collect_frames(&state).await)
}

/// Query both upstreams concurrently and format the result.
///
/// Upstream failures become placeholders; this never fails.
#[instrument(skip(state), fields(slots = state.layout.len()))]
pub async fn collect_frames(state: &AppState) -> FrameResponse {
    let requested = state.layout.analytics_metrics();

    let analytics = async {
        if requested.is_empty() {
            return Ok(AnalyticsMetrics::new());
        }
        state.analytics.fetch_metrics(&requested).await
    };
    let repo = async {
        if !state.layout.uses_repo() {
            return RepoStatus::Disabled;
        }
        state
            .repo
            .fetch_repo_stats(&state.target.owner, &state.target.name)
            .await
    };

    let (analytics, repo) = tokio::join!(analytics, repo);

    let analytics = match analytics {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            error!(error = %e, "Analytics fetch failed, serving placeholders");
            telemetry::inc_upstream_errors(Service::Mixpanel);
            None
        }
    };

    let response = FrameResponse {
        frames: format_frames(&state.layout, analytics.as_ref(), &repo),
    };

    let placeholders = response.placeholder_count();
    telemetry::add_placeholder_frames(placeholders as u64);
    debug!(placeholders, "Frames ready");

    response
}
