//! Frame layout: which value goes into which slot, with which icon.

use std::str::FromStr;

use strum::{Display, EnumString};

use crate::analytics::{AnalyticsMetric, Reduction};
use crate::error::ConfigError;
use crate::repo::RepoStats;

/// Prefix marking a repository-backed slot in the layout string.
pub const REPO_PREFIX: &str = "github:";

/// Repository statistic shown in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RepoField {
    /// Stargazer count.
    Stars,
    /// Fork count.
    Forks,
    /// Open issue count (GitHub includes pull requests here).
    OpenIssues,
}

impl RepoField {
    /// Pick this field out of a stats record.
    pub fn value(self, stats: &RepoStats) -> u64 {
        match self {
            RepoField::Stars => stats.stars,
            RepoField::Forks => stats.forks,
            RepoField::OpenIssues => stats.open_issues,
        }
    }
}

/// Where a slot's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotSource {
    /// A series of the analytics report and its reduction.
    Analytics(AnalyticsMetric),
    /// A repository statistic.
    Repo(RepoField),
}

/// One fixed position in the frame sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSlot {
    /// Value source.
    pub source: SlotSource,
    /// Icon id bound to this position.
    pub icon: String,
}

impl FromStr for FrameSlot {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigError::Invalid {
            field: "FRAMES",
            reason,
        };

        let (source, icon) = s
            .split_once('=')
            .ok_or_else(|| invalid(format!("slot {s:?} is not of the form source=icon")))?;
        let (source, icon) = (source.trim(), icon.trim());

        if source.is_empty() {
            return Err(invalid(format!("slot {s:?} has an empty source")));
        }
        if icon.is_empty() {
            return Err(invalid(format!("slot {s:?} has an empty icon")));
        }

        let source = match source.strip_prefix(REPO_PREFIX) {
            Some(field) => SlotSource::Repo(
                field
                    .parse()
                    .map_err(|_| invalid(format!("unknown repository field {field:?}")))?,
            ),
            None => SlotSource::Analytics(parse_metric(source)),
        };

        Ok(FrameSlot {
            source,
            icon: icon.to_string(),
        })
    }
}

/// `sum:runs` is the window total of `runs`; a bare name, or a prefix that
/// is not a reduction, is the latest value of the whole string.
fn parse_metric(source: &str) -> AnalyticsMetric {
    if let Some((prefix, name)) = source.split_once(':') {
        if let Ok(reduction) = prefix.trim().parse::<Reduction>() {
            let name = name.trim();
            if !name.is_empty() {
                return AnalyticsMetric {
                    name: name.to_string(),
                    reduction,
                };
            }
        }
    }
    AnalyticsMetric::latest(source)
}

/// Ordered, non-empty list of slots. Fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    slots: Vec<FrameSlot>,
}

impl FrameLayout {
    /// Build a layout from slots. Fails on an empty list.
    pub fn new(slots: Vec<FrameSlot>) -> Result<Self, ConfigError> {
        if slots.is_empty() {
            return Err(ConfigError::Invalid {
                field: "FRAMES",
                reason: "layout must contain at least one slot".to_string(),
            });
        }
        Ok(Self { slots })
    }

    /// Slots in display order.
    pub fn slots(&self) -> &[FrameSlot] {
        &self.slots
    }

    /// Number of frames every response carries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Distinct analytics metrics, in first-use order.
    pub fn analytics_metrics(&self) -> Vec<AnalyticsMetric> {
        let mut metrics: Vec<AnalyticsMetric> = Vec::new();
        for slot in &self.slots {
            if let SlotSource::Analytics(metric) = &slot.source {
                if !metrics.contains(metric) {
                    metrics.push(metric.clone());
                }
            }
        }
        metrics
    }

    /// Whether any slot reads repository statistics.
    pub fn uses_repo(&self) -> bool {
        self.slots
            .iter()
            .any(|slot| matches!(slot.source, SlotSource::Repo(_)))
    }
}

impl FromStr for FrameLayout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slots = s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse::<FrameSlot>)
            .collect::<Result<Vec<FrameSlot>, _>>()?;
        Self::new(slots)
    }
}
