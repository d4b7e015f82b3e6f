// ABOUTME: Runs git commands bound to a repository directory with optional wall-clock timeouts
// Captures exit code, stdout and stderr separately; never touches the caller's cwd

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::error::GitError;

/// Captured result of one finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Best error text for display: stderr, falling back to stdout
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitExecutor {
    program: OsString,
}

impl GitExecutor {
    pub fn new() -> Self {
        Self {
            program: OsString::from("git"),
        }
    }

    /// Use a different executable in place of `git` (tests use stand-in scripts)
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `program args...` inside `repo_path`.
    ///
    /// A non-zero exit is still `Ok`; only a missing directory, a spawn
    /// failure, or an elapsed timeout produce `Err`. A timed-out child is not
    /// killed: it keeps running detached and its result is discarded.
    pub async fn run(
        &self,
        repo_path: &Path,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, GitError> {
        if !repo_path.is_dir() {
            return Err(GitError::NotFound(repo_path.to_path_buf()));
        }

        debug!("git {} (in {})", args.join(" "), repo_path.display());

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .current_dir(repo_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            // Output is matched against English messages
            .env("LC_ALL", "C")
            .env("LANGUAGE", "C")
            .stdin(Stdio::null());

        let output = match timeout {
            Some(limit) => match tokio::time::timeout(limit, command.output()).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(GitError::Timeout {
                        command: args.join(" "),
                        timeout: limit,
                    });
                }
            },
            None => command.output().await?,
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Like [`run`](Self::run) but a non-zero exit becomes `CommandFailed`
    pub async fn run_checked(
        &self,
        repo_path: &Path,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, GitError> {
        let output = self.run(repo_path, args, timeout).await?;

        if output.success() {
            Ok(output)
        } else {
            Err(GitError::CommandFailed {
                command: args.join(" "),
                exit_code: output.exit_code,
                stderr: output.error_text(),
            })
        }
    }
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new()
    }
}
