//! Mixpanel Insights response types.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::UpstreamError;
use crate::telemetry::Service;

use super::{AnalyticsMetric, AnalyticsMetrics, Reduction};

/// Key used by non-time-series reports for their single value.
const ALL_KEY: &str = "all";

/// Saved Insights report as returned by `/insights`.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsResponse {
    /// Series name to (date key to value).
    pub series: Option<BTreeMap<String, BTreeMap<String, Value>>>,
    /// When Mixpanel computed the report.
    pub computed_at: Option<String>,
    /// Report date range.
    pub date_range: Option<DateRange>,
}

/// Date range covered by a report.
#[derive(Debug, Clone, Deserialize)]
pub struct DateRange {
    /// First day (inclusive).
    pub from_date: Option<String>,
    /// Last day (inclusive).
    pub to_date: Option<String>,
}

fn malformed(reason: String) -> UpstreamError {
    UpstreamError::Malformed {
        service: Service::Mixpanel,
        reason,
    }
}

/// Convert one data point to a count. Fractions truncate toward zero.
fn to_count(name: &str, value: &Value) -> Result<u64, UpstreamError> {
    if let Some(v) = value.as_u64() {
        return Ok(v);
    }
    match value.as_f64() {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v.trunc() as u64),
        _ => Err(malformed(format!(
            "series {name:?} has non-count value {value}"
        ))),
    }
}

/// Apply `reduction` to one series. `None` when there is nothing to report.
fn reduce_series(
    name: &str,
    points: &BTreeMap<String, Value>,
    reduction: Reduction,
) -> Result<Option<u64>, UpstreamError> {
    if let Some(all) = points.get(ALL_KEY) {
        return to_count(name, all).map(Some);
    }

    match reduction {
        // ISO-8601 date keys sort chronologically.
        Reduction::Latest => points
            .values()
            .next_back()
            .map(|point| to_count(name, point))
            .transpose(),
        Reduction::Sum => points
            .values()
            .try_fold(0u64, |total, point| -> Result<u64, UpstreamError> {
                Ok(total.saturating_add(to_count(name, point)?))
            })
            .map(Some),
    }
}

impl InsightsResponse {
    /// Reduce each requested series to one number.
    ///
    /// A series keyed by `"all"` (non-time-series report) yields that value
    /// for either reduction. Series the report lacks, and empty series under
    /// `latest`, are logged and left out so only their own slots go blank.
    pub fn reduce(&self, metrics: &[AnalyticsMetric]) -> Result<AnalyticsMetrics, UpstreamError> {
        let series = self
            .series
            .as_ref()
            .ok_or_else(|| malformed("response has no series".to_string()))?;

        let mut values = AnalyticsMetrics::new();
        for metric in metrics {
            let Some(points) = series.get(&metric.name) else {
                warn!(series = %metric.name, "Series missing from analytics report");
                continue;
            };

            match reduce_series(&metric.name, points, metric.reduction)? {
                Some(value) => {
                    values.insert(metric.key(), value);
                }
                None => warn!(series = %metric.name, "Series has no data points"),
            }
        }

        Ok(values)
    }
}
