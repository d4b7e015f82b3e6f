// ABOUTME: Git integration: process execution, repository discovery, sync probing, bulk pulls,
// single-repository operations and project-list cloning

pub mod discovery;
pub mod error;
pub mod executor;
pub mod operations;
pub mod project_list;
pub mod prober;
pub mod puller;

pub use discovery::{discover, is_repository_root};
pub use error::GitError;
pub use executor::{CommandOutput, GitExecutor};
pub use operations::{
    commit_and_push, hard_reset, working_diff, CommitPushResult, OperationResult,
    NO_CHANGES_MESSAGE, PUSHED_MESSAGE, RESET_MESSAGE,
};
pub use prober::{SyncProber, SyncStatus, UpstreamState};
pub use puller::{ParallelPuller, PullOutcome, PullReport};
