// ABOUTME: Error taxonomy for git command execution against configuration repositories

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Repository not found at path: {}", .0.display())]
    NotFound(PathBuf),
    #[error("git {command} timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
    #[error("No upstream configured for the current branch")]
    NoUpstream,
    #[error("git {command} failed: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("Failed to launch git: {0}")]
    Io(#[from] std::io::Error),
}

/// Classify a failed command whose stderr reports a missing upstream
pub(crate) fn classify_upstream_failure(command: &str, exit_code: Option<i32>, stderr: &str) -> GitError {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("no upstream")
        || stderr_lower.contains("does not point to a branch")
        || stderr_lower.contains("no such branch")
    {
        GitError::NoUpstream
    } else {
        GitError::CommandFailed {
            command: command.to_string(),
            exit_code,
            stderr: stderr.to_string(),
        }
    }
}
