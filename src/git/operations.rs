// ABOUTME: User-initiated single-repository git operations: commit+push, hard reset, diff
// Each sequence is strictly ordered and stops at the first failing step; nothing is rolled back

use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info};

use super::error::GitError;
use super::executor::GitExecutor;

pub const NO_CHANGES_MESSAGE: &str = "no changes to commit";
pub const PUSHED_MESSAGE: &str = "pushed successfully";
pub const RESET_MESSAGE: &str = "reset to upstream";

/// Outcome of a user-initiated operation, shown to the user as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub ok: bool,
    pub message: String,
}

/// Result of [`commit_and_push`]
pub type CommitPushResult = OperationResult;

impl OperationResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

impl From<GitError> for OperationResult {
    fn from(err: GitError) -> Self {
        match err {
            // The captured stderr is what the user needs to act on
            GitError::CommandFailed { stderr, .. } if !stderr.is_empty() => Self::failure(stderr),
            other => Self::failure(other.to_string()),
        }
    }
}

/// Stage everything, commit if anything changed, then push to the upstream.
///
/// Committing an unmodified tree is a successful no-op; no empty commit is created.
pub async fn commit_and_push(
    executor: &GitExecutor,
    repo_path: &Path,
    message: &str,
) -> CommitPushResult {
    debug!("Committing and pushing changes for: {}", repo_path.display());

    if message.trim().is_empty() {
        return OperationResult::failure("Commit message cannot be empty");
    }

    match commit_and_push_steps(executor, repo_path, message).await {
        Ok(result) => result,
        Err(e) => {
            error!("Commit/push failed for {}: {}", repo_path.display(), e);
            e.into()
        }
    }
}

async fn commit_and_push_steps(
    executor: &GitExecutor,
    repo_path: &Path,
    message: &str,
) -> Result<CommitPushResult, GitError> {
    debug!("Adding all changes...");
    executor.run_checked(repo_path, &["add", "-A"], None).await?;

    let status = executor
        .run_checked(repo_path, &["status", "--porcelain"], None)
        .await?;
    if status.stdout.trim().is_empty() {
        info!("Nothing to commit in {}", repo_path.display());
        return Ok(OperationResult::success(NO_CHANGES_MESSAGE));
    }

    // --no-gpg-sign avoids hanging on a GPG passphrase prompt
    debug!("Committing with message: {}", message);
    executor
        .run_checked(repo_path, &["commit", "--no-gpg-sign", "-m", message], None)
        .await?;

    debug!("Pushing changes...");
    executor.run_checked(repo_path, &["push"], None).await?;

    info!("Committed and pushed {}", repo_path.display());
    Ok(OperationResult::success(PUSHED_MESSAGE))
}

/// Discard all local work: fetch, reset to the upstream tip, remove untracked files.
///
/// Destructive and irreversible. Callers must obtain confirmation first.
pub async fn hard_reset(executor: &GitExecutor, repo_path: &Path) -> OperationResult {
    info!("Hard reset requested for {}", repo_path.display());

    match hard_reset_steps(executor, repo_path).await {
        Ok(()) => OperationResult::success(RESET_MESSAGE),
        Err(e) => {
            error!("Hard reset failed for {}: {}", repo_path.display(), e);
            e.into()
        }
    }
}

async fn hard_reset_steps(executor: &GitExecutor, repo_path: &Path) -> Result<(), GitError> {
    executor.run_checked(repo_path, &["fetch"], None).await?;
    executor
        .run_checked(repo_path, &["reset", "--hard", "@{upstream}"], None)
        .await?;
    executor.run_checked(repo_path, &["clean", "-fd"], None).await?;
    Ok(())
}

/// Uncommitted changes to tracked files as a unified diff, `None` when there are none
pub async fn working_diff(executor: &GitExecutor, repo_path: &Path) -> Option<String> {
    match executor.run_checked(repo_path, &["diff", "HEAD"], None).await {
        Ok(output) if !output.stdout.trim().is_empty() => Some(output.stdout),
        Ok(_) => None,
        Err(e) => {
            debug!("No diff for {}: {}", repo_path.display(), e);
            None
        }
    }
}
