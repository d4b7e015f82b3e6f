// ABOUTME: Bounded-concurrency "pull latest" across every repository candidate under a root
// Best effort: per-repository failures are recorded, the batch itself never fails

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::discovery::list_subdirectories;
use super::executor::GitExecutor;

const PULL_ARGS: &[&str] = &["pull", "--ff-only"];
const UP_TO_DATE_MARKER: &str = "Already up to date";

pub const DEFAULT_PULL_WORKERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullOutcome {
    pub repo_path: PathBuf,
    pub succeeded: bool,
    /// The pull brought in new commits
    pub updated: bool,
    pub message: String,
}

impl PullOutcome {
    fn failed(repo_path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            repo_path,
            succeeded: false,
            updated: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PullReport {
    pub outcomes: HashMap<PathBuf, PullOutcome>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PullReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, repo_path: &Path) -> Option<&PullOutcome> {
        self.outcomes.get(repo_path)
    }

    /// Failed outcomes sorted by path
    pub fn failures(&self) -> Vec<&PullOutcome> {
        let mut failed: Vec<&PullOutcome> =
            self.outcomes.values().filter(|o| !o.succeeded).collect();
        failed.sort_by(|a, b| a.repo_path.cmp(&b.repo_path));
        failed
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.succeeded).count()
    }

    /// All outcomes sorted by path
    pub fn sorted(&self) -> Vec<&PullOutcome> {
        let mut all: Vec<&PullOutcome> = self.outcomes.values().collect();
        all.sort_by(|a, b| a.repo_path.cmp(&b.repo_path));
        all
    }
}

#[derive(Debug, Clone)]
pub struct ParallelPuller {
    executor: GitExecutor,
    workers: usize,
    timeout: Duration,
}

impl ParallelPuller {
    pub fn new(executor: GitExecutor, workers: usize, timeout: Duration) -> Self {
        Self {
            executor,
            workers: workers.max(1),
            timeout,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pull every immediate subdirectory of `root`
    pub async fn pull_all(&self, root: &Path) -> PullReport {
        self.pull_paths(list_subdirectories(root)).await
    }

    /// Pull every immediate subdirectory of `root`, ignoring the outcomes
    pub async fn pull_all_discarding(&self, root: &Path) {
        let report = self.pull_all(root).await;
        debug!("Discarding {} pull outcomes", report.len());
    }

    /// Pull the given paths with at most `workers` pulls in flight.
    ///
    /// Returns exactly one outcome per path. A pull that exceeds the timeout
    /// is recorded as failed and left running detached.
    pub async fn pull_paths(&self, paths: Vec<PathBuf>) -> PullReport {
        let started = Instant::now();
        info!(
            "Pulling {} repositories ({} workers, {}s timeout)",
            paths.len(),
            self.workers,
            self.timeout.as_secs()
        );

        // Pre-seed failures so a worker that dies still leaves its outcome behind
        let mut outcomes: HashMap<PathBuf, PullOutcome> = paths
            .iter()
            .map(|path| {
                (
                    path.clone(),
                    PullOutcome::failed(path.clone(), "pull did not complete"),
                )
            })
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for path in paths {
            let semaphore = Arc::clone(&semaphore);
            let executor = self.executor.clone();
            let timeout = self.timeout;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                pull_one(&executor, path, timeout).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    outcomes.insert(outcome.repo_path.clone(), outcome);
                }
                Err(e) => warn!("Pull worker aborted: {}", e),
            }
        }

        let report = PullReport {
            outcomes,
            elapsed: started.elapsed(),
        };

        info!(
            "Pull complete: {}/{} succeeded in {:.1}s",
            report.succeeded_count(),
            report.len(),
            report.elapsed.as_secs_f64()
        );
        report
    }
}

async fn pull_one(executor: &GitExecutor, repo_path: PathBuf, timeout: Duration) -> PullOutcome {
    match executor.run(&repo_path, PULL_ARGS, Some(timeout)).await {
        Ok(output) if output.success() => {
            let updated = !output.stdout.contains(UP_TO_DATE_MARKER);
            debug!(
                "Pulled {} ({})",
                repo_path.display(),
                if updated { "updated" } else { "up to date" }
            );
            PullOutcome {
                repo_path,
                succeeded: true,
                updated,
                message: if updated {
                    "updated".to_string()
                } else {
                    "already up to date".to_string()
                },
            }
        }
        Ok(output) => {
            let message = output.error_text();
            warn!("Pull failed for {}: {}", repo_path.display(), message);
            PullOutcome::failed(repo_path, message)
        }
        Err(e) => {
            warn!("Pull failed for {}: {}", repo_path.display(), e);
            PullOutcome::failed(repo_path, e.to_string())
        }
    }
}
