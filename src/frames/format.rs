//! Pure mapping from upstream results to display frames.

use crate::analytics::AnalyticsMetrics;
use crate::repo::RepoStatus;

use super::layout::{FrameLayout, SlotSource};
use super::DisplayFrame;

/// Shown when a value could not be fetched.
pub const PLACEHOLDER_UNAVAILABLE: &str = "N/A";

/// Shown in repository slots when the integration is not configured.
pub const PLACEHOLDER_DISABLED: &str = "OFF";

/// Format a count for the narrow display.
///
/// - below 10,000: plain digits (`9999`)
/// - below 1,000,000: thousands with one truncated decimal (`12.3K`)
/// - otherwise: millions with one truncated decimal (`1.2M`)
pub fn format_count(value: u64) -> String {
    match value {
        0..=9_999 => value.to_string(),
        10_000..=999_999 => format!("{}.{}K", value / 1_000, (value % 1_000) / 100),
        _ => format!(
            "{}.{}M",
            value / 1_000_000,
            (value % 1_000_000) / 100_000
        ),
    }
}

/// Build one frame per layout slot.
///
/// `analytics` is `None` when the analytics call failed; those slots get
/// [`PLACEHOLDER_UNAVAILABLE`]. The output length always equals
/// `layout.len()`.
pub fn format_frames(
    layout: &FrameLayout,
    analytics: Option<&AnalyticsMetrics>,
    repo: &RepoStatus,
) -> Vec<DisplayFrame> {
    layout
        .slots()
        .iter()
        .map(|slot| {
            let text = match &slot.source {
                SlotSource::Analytics(metric) => analytics
                    .and_then(|metrics| metrics.get(&metric.key()))
                    .map(|value| format_count(*value))
                    .unwrap_or_else(|| PLACEHOLDER_UNAVAILABLE.to_string()),
                SlotSource::Repo(field) => match repo {
                    RepoStatus::Available(stats) => format_count(field.value(stats)),
                    RepoStatus::Unavailable => PLACEHOLDER_UNAVAILABLE.to_string(),
                    RepoStatus::Disabled => PLACEHOLDER_DISABLED.to_string(),
                },
            };
            DisplayFrame::new(slot.icon.clone(), text)
        })
        .collect()
}
