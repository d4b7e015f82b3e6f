// ABOUTME: Frozen result of one sync pass: discovered repositories and their probed status
// Lookups never run git; a new session is the only way to observe newer state

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::git::discovery::normalize_root;
use crate::git::{PullReport, SyncStatus};
use crate::models::RepositoryHandle;

#[derive(Debug, Clone, Serialize)]
pub struct SyncSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    root: PathBuf,
    repositories: Vec<RepositoryHandle>,
    statuses: HashMap<PathBuf, SyncStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull_report: Option<PullReport>,
}

impl SyncSession {
    pub fn new(
        root: PathBuf,
        repositories: Vec<RepositoryHandle>,
        statuses: HashMap<PathBuf, SyncStatus>,
        pull_report: Option<PullReport>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            root,
            repositories,
            statuses,
            pull_report,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discovered repositories, sorted by folder name
    pub fn repositories(&self) -> &[RepositoryHandle] {
        &self.repositories
    }

    pub fn pull_report(&self) -> Option<&PullReport> {
        self.pull_report.as_ref()
    }

    /// Frozen status for `repo_path`; paths outside this session read as absent
    pub fn status(&self, repo_path: &Path) -> SyncStatus {
        self.statuses
            .get(repo_path)
            .or_else(|| self.statuses.get(&normalize_root(repo_path)))
            .copied()
            .unwrap_or_else(SyncStatus::absent)
    }

    pub fn has_changes(&self, repo_path: &Path) -> bool {
        self.status(repo_path).has_changes()
    }

    /// Whether this session's pull of `repo_path` failed. `false` when no pull ran.
    pub fn pull_failed(&self, repo_path: &Path) -> bool {
        self.pull_report
            .as_ref()
            .and_then(|report| {
                report
                    .get(repo_path)
                    .or_else(|| report.get(&normalize_root(repo_path)))
            })
            .is_some_and(|outcome| !outcome.succeeded)
    }

    /// Repositories with uncommitted or unpushed work
    pub fn changed_repositories(&self) -> Vec<&RepositoryHandle> {
        self.repositories
            .iter()
            .filter(|handle| self.has_changes(&handle.path))
            .collect()
    }

    /// Look up a discovered repository by folder name
    pub fn find(&self, name: &str) -> Option<&RepositoryHandle> {
        self.repositories.iter().find(|handle| handle.name() == name)
    }
}
