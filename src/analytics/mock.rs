//! Mock analytics source for unit testing.
//!
//! Serves canned metrics without network access and counts calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::telemetry::Service;

use super::{AnalyticsMetric, AnalyticsMetrics, AnalyticsSource};

/// What the mock answers with.
#[derive(Debug, Clone)]
enum MockBehavior {
    Metrics(AnalyticsMetrics),
    Status(u16),
}

/// Mock analytics source for testing.
#[derive(Debug, Clone)]
pub struct MockAnalytics {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockAnalytics {
    /// Answer every call with these metrics, keyed like
    /// [`AnalyticsMetric::key`]. Unknown metrics are left out.
    pub fn with_metrics<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            behavior: MockBehavior::Metrics(
                metrics.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every call with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self {
            behavior: MockBehavior::Status(status),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalyticsSource for MockAnalytics {
    async fn fetch_metrics(
        &self,
        metrics: &[AnalyticsMetric],
    ) -> Result<AnalyticsMetrics, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Status(status) => Err(UpstreamError::status(
                Service::Mixpanel,
                *status,
                "mock failure",
            )),
            MockBehavior::Metrics(all) => Ok(metrics
                .iter()
                .filter_map(|metric| {
                    let key = metric.key();
                    all.get(&key).map(|value| (key, *value))
                })
                .collect()),
        }
    }
}
