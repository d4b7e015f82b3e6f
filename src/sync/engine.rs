// ABOUTME: Sync engine: builds sync sessions (pull, discover, probe) and runs audited operations

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::session::SyncSession;
use crate::audit;
use crate::config::SyncConfig;
use crate::git::discovery::{discover, normalize_root};
use crate::git::{
    commit_and_push, hard_reset, working_diff, CommitPushResult, GitExecutor, OperationResult,
    ParallelPuller, PullReport, SyncProber, SyncStatus,
};

#[derive(Debug, Clone)]
pub struct SyncEngine {
    executor: GitExecutor,
    puller: ParallelPuller,
    prober: SyncProber,
    workers: usize,
}

impl SyncEngine {
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_executor(config, GitExecutor::new())
    }

    pub fn with_executor(config: &SyncConfig, executor: GitExecutor) -> Self {
        let workers = config.pull_workers.max(1);
        Self {
            puller: ParallelPuller::new(executor.clone(), workers, config.pull_timeout()),
            prober: SyncProber::new(executor.clone(), config.probe_timeout())
                .with_untracked(config.count_untracked_as_dirty),
            executor,
            workers,
        }
    }

    pub fn executor(&self) -> &GitExecutor {
        &self.executor
    }

    pub async fn pull_all(&self, root: &Path) -> PullReport {
        self.puller.pull_all(root).await
    }

    /// Run one sync pass over `root`: optionally pull everything, then discover
    /// and probe each repository exactly once.
    pub async fn begin_session(&self, root: &Path, pull: bool) -> SyncSession {
        let started = Instant::now();
        let root = normalize_root(root);

        let pull_report = if pull {
            Some(self.puller.pull_all(&root).await)
        } else {
            None
        };

        let repositories = discover(&root);
        let paths: Vec<PathBuf> = repositories.iter().map(|h| h.path.clone()).collect();
        let statuses = self.probe_all(paths).await;

        let session = SyncSession::new(root, repositories, statuses, pull_report);
        info!(
            session_id = %session.id(),
            repositories = session.repositories().len(),
            changed = session.changed_repositories().len(),
            "Sync session ready in {:.1}s",
            started.elapsed().as_secs_f64()
        );
        session
    }

    /// Probe `paths` on the bounded pool; every path gets a status
    async fn probe_all(&self, paths: Vec<PathBuf>) -> HashMap<PathBuf, SyncStatus> {
        let mut statuses: HashMap<PathBuf, SyncStatus> = paths
            .iter()
            .map(|path| (path.clone(), SyncStatus::absent()))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for path in paths {
            let semaphore = Arc::clone(&semaphore);
            let prober = self.prober.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let status = prober.probe(&path).await;
                (path, status)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((path, status)) => {
                    statuses.insert(path, status);
                }
                Err(e) => warn!("Probe worker aborted: {}", e),
            }
        }

        statuses
    }

    pub async fn commit_and_push(
        &self,
        session: Option<&SyncSession>,
        repo_path: &Path,
        message: &str,
    ) -> CommitPushResult {
        let result = commit_and_push(&self.executor, repo_path, message).await;
        audit::audit_commit_pushed(session.map(SyncSession::id), repo_path, message, &result);
        result
    }

    pub async fn hard_reset(
        &self,
        session: Option<&SyncSession>,
        repo_path: &Path,
    ) -> OperationResult {
        let result = hard_reset(&self.executor, repo_path).await;
        audit::audit_hard_reset(session.map(SyncSession::id), repo_path, &result);
        result
    }

    pub async fn diff(&self, repo_path: &Path) -> Option<String> {
        working_diff(&self.executor, repo_path).await
    }
}
