// ABOUTME: Per-repository sync status probing (uncommitted changes vs unpushed commits)
// Probing is total: missing repositories and failing commands degrade to false flags

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use super::discovery::is_repository_root;
use super::error::{GitError, classify_upstream_failure};
use super::executor::GitExecutor;

const STATUS_PORCELAIN_ARGS: &[&str] = &["status", "--porcelain"];
const STATUS_PORCELAIN_TRACKED_ARGS: &[&str] = &["status", "--porcelain", "--untracked-files=no"];
const AHEAD_COUNT_ARGS: &[&str] = &["rev-list", "--count", "@{upstream}..HEAD"];

/// Whether the current branch tracks an upstream ref
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamState {
    Tracking,
    Missing,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncStatus {
    pub is_dirty: bool,
    pub is_ahead: bool,
    #[serde(default)]
    pub upstream: UpstreamState,
}

impl SyncStatus {
    /// Status reported for paths that are not repositories
    pub const fn absent() -> Self {
        Self {
            is_dirty: false,
            is_ahead: false,
            upstream: UpstreamState::Unknown,
        }
    }

    pub const fn has_changes(&self) -> bool {
        self.is_dirty || self.is_ahead
    }
}

#[derive(Debug, Clone)]
pub struct SyncProber {
    executor: GitExecutor,
    timeout: Duration,
    count_untracked: bool,
}

impl SyncProber {
    pub fn new(executor: GitExecutor, timeout: Duration) -> Self {
        Self {
            executor,
            timeout,
            count_untracked: true,
        }
    }

    /// Whether untracked files make a working tree dirty (default: yes)
    pub fn with_untracked(mut self, count_untracked: bool) -> Self {
        self.count_untracked = count_untracked;
        self
    }

    /// Probe one repository. Never fails; see [`dirty`](Self::dirty) and
    /// [`ahead_count`](Self::ahead_count) for the fallible building blocks.
    pub async fn probe(&self, repo_path: &Path) -> SyncStatus {
        if !is_repository_root(repo_path) {
            debug!("Not a repository root, skipping probe: {}", repo_path.display());
            return SyncStatus::absent();
        }

        let mut status = SyncStatus::absent();

        match self.dirty(repo_path).await {
            Ok(dirty) => status.is_dirty = dirty,
            Err(e) => warn!("Dirty check failed for {}: {}", repo_path.display(), e),
        }

        match self.ahead_count(repo_path).await {
            Ok(count) => {
                status.is_ahead = count > 0;
                status.upstream = UpstreamState::Tracking;
            }
            Err(GitError::NoUpstream) => {
                debug!("No upstream configured for {}", repo_path.display());
                status.upstream = UpstreamState::Missing;
            }
            Err(e) => warn!("Ahead check failed for {}: {}", repo_path.display(), e),
        }

        debug!(
            "Probed {}: dirty={} ahead={} upstream={:?}",
            repo_path.display(),
            status.is_dirty,
            status.is_ahead,
            status.upstream
        );
        status
    }

    /// Any porcelain status output counts as dirty
    pub async fn dirty(&self, repo_path: &Path) -> Result<bool, GitError> {
        let args = if self.count_untracked {
            STATUS_PORCELAIN_ARGS
        } else {
            STATUS_PORCELAIN_TRACKED_ARGS
        };

        let output = self
            .executor
            .run_checked(repo_path, args, Some(self.timeout))
            .await?;

        Ok(!output.stdout.trim().is_empty())
    }

    /// Number of local commits not present on the configured upstream
    pub async fn ahead_count(&self, repo_path: &Path) -> Result<u32, GitError> {
        let output = self
            .executor
            .run(repo_path, AHEAD_COUNT_ARGS, Some(self.timeout))
            .await?;

        if !output.success() {
            return Err(classify_upstream_failure(
                &AHEAD_COUNT_ARGS.join(" "),
                output.exit_code,
                &output.error_text(),
            ));
        }

        output
            .stdout
            .trim()
            .parse::<u32>()
            .map_err(|e| GitError::CommandFailed {
                command: AHEAD_COUNT_ARGS.join(" "),
                exit_code: output.exit_code,
                stderr: format!("unexpected commit count '{}': {}", output.stdout.trim(), e),
            })
    }
}
