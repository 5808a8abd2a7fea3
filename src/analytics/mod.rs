//! Product-analytics integration.
//!
//! This module handles:
//! - The [`AnalyticsSource`] seam used by the HTTP layer
//! - Metric requests and how a report series reduces to one number
//! - Mixpanel Insights client and response types
//! - Mock source for testing

pub mod client;
pub mod mock;
pub mod types;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use strum::{Display, EnumString};

use crate::error::UpstreamError;

pub use client::MixpanelClient;
pub use mock::MockAnalytics;
pub use types::InsightsResponse;

/// Metric key (see [`AnalyticsMetric::key`]) to value.
pub type AnalyticsMetrics = BTreeMap<String, u64>;

/// How a time series collapses into the single number a frame shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Reduction {
    /// Most recent data point (e.g. today's active users).
    #[default]
    Latest,
    /// Total over every point in the report window (e.g. runs in 7 days).
    Sum,
}

/// One requested analytics number: a report series plus its reduction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalyticsMetric {
    /// Series name in the report.
    pub name: String,
    /// How the series is reduced.
    pub reduction: Reduction,
}

impl AnalyticsMetric {
    /// Latest value of `name`.
    pub fn latest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reduction: Reduction::Latest,
        }
    }

    /// Window total of `name`.
    pub fn sum(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reduction: Reduction::Sum,
        }
    }

    /// Key in [`AnalyticsMetrics`]: the bare name for `latest`,
    /// `"<reduction>:<name>"` otherwise.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AnalyticsMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reduction {
            Reduction::Latest => f.write_str(&self.name),
            reduction => write!(f, "{}:{}", reduction, self.name),
        }
    }
}

/// Anything that can produce analytics metrics.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Fetch the given metrics.
    ///
    /// A metric whose series the report lacks is left out of the result;
    /// only a failed or unreadable response is an error.
    async fn fetch_metrics(
        &self,
        metrics: &[AnalyticsMetric],
    ) -> Result<AnalyticsMetrics, UpstreamError>;
}
