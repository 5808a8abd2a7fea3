//! Mock repository source for unit testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{RepoSource, RepoStatus};

/// Mock repository source that returns a fixed status and counts the
/// lookups that would have reached the network.
#[derive(Debug, Clone)]
pub struct MockRepo {
    status: RepoStatus,
    calls: Arc<AtomicUsize>,
}

impl MockRepo {
    /// Always answer with `status`.
    pub fn new(status: RepoStatus) -> Self {
        Self {
            status,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Outbound calls made so far. A disabled source never calls out.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoSource for MockRepo {
    async fn fetch_repo_stats(&self, _owner: &str, _repo: &str) -> RepoStatus {
        if self.status != RepoStatus::Disabled {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        self.status
    }
}
