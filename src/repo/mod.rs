//! Source-hosting integration (GitHub repository statistics).
//!
//! Repository stats are supplementary: failures never propagate, they
//! surface as [`RepoStatus::Unavailable`].

pub mod client;
pub mod mock;

use async_trait::async_trait;
use serde::Deserialize;

pub use client::GithubClient;
pub use mock::MockRepo;

/// Counts shown on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepoStats {
    /// Stargazers.
    pub stars: u64,
    /// Forks.
    pub forks: u64,
    /// Open issues and pull requests.
    pub open_issues: u64,
}

/// Outcome of a repository stats lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    /// No token configured; no call was made.
    Disabled,
    /// The call was made and failed.
    Unavailable,
    /// Fresh stats.
    Available(RepoStats),
}

/// Repository payload from `GET /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryResponse {
    /// Full name, e.g. "owner/repo".
    pub full_name: Option<String>,
    /// Star count.
    pub stargazers_count: Option<u64>,
    /// Fork count.
    pub forks_count: Option<u64>,
    /// Open issue count.
    pub open_issues_count: Option<u64>,
}

impl RepositoryResponse {
    /// Extract stats; every count must be present.
    pub fn stats(&self) -> Option<RepoStats> {
        Some(RepoStats {
            stars: self.stargazers_count?,
            forks: self.forks_count?,
            open_issues: self.open_issues_count?,
        })
    }
}

/// Anything that can look up repository statistics.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Look up stats for `owner/repo`. Never fails; see [`RepoStatus`].
    async fn fetch_repo_stats(&self, owner: &str, repo: &str) -> RepoStatus;
}
