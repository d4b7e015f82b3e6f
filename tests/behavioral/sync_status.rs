// ABOUTME: Behavioral tests for sync status probing against real temporary repositories
// Covers clean, dirty, ahead, untracked and no-upstream states plus non-repository paths

use anyhow::Result;
use pretty_assertions::assert_eq;
use std::path::Path;
use std::time::Duration;

use pinmatrix::git::{GitExecutor, SyncProber, SyncStatus, UpstreamState};

#[cfg(unix)]
use super::fixtures::FakeGit;
use super::fixtures::{ConfigRoot, TestRepo, Upstream};

fn prober() -> SyncProber {
    SyncProber::new(GitExecutor::new(), Duration::from_secs(10))
}

/// Fresh clone has nothing to commit and nothing to push
#[tokio::test]
async fn test_fresh_clone_is_clean() -> Result<()> {
    let upstream = Upstream::new()?;
    let root = ConfigRoot::new()?;
    let repo = TestRepo::clone_into(&upstream, root.path(), "alpha-kustomization")?;

    let status = prober().probe(repo.path()).await;

    assert_eq!(
        status,
        SyncStatus {
            is_dirty: false,
            is_ahead: false,
            upstream: UpstreamState::Tracking,
        }
    );
    assert!(!status.has_changes());
    Ok(())
}

/// Modified tracked file makes the repository dirty
#[tokio::test]
async fn test_modified_file_is_dirty() -> Result<()> {
    let upstream = Upstream::new()?;
    let root = ConfigRoot::new()?;
    let repo = TestRepo::clone_into(&upstream, root.path(), "alpha-kustomization")?;

    repo.write("README.md", "# Changed\n")?;
    let status = prober().probe(repo.path()).await;

    assert!(status.is_dirty);
    assert!(!status.is_ahead);
    assert!(status.has_changes());
    Ok(())
}

/// Untracked files count as dirty unless disabled
#[tokio::test]
async fn test_untracked_file_respects_setting() -> Result<()> {
    let upstream = Upstream::new()?;
    let root = ConfigRoot::new()?;
    let repo = TestRepo::clone_into(&upstream, root.path(), "alpha-kustomization")?;

    repo.write("notes.txt", "scratch\n")?;

    assert!(prober().probe(repo.path()).await.is_dirty);
    assert!(
        !prober()
            .with_untracked(false)
            .probe(repo.path())
            .await
            .is_dirty,
        "untracked files should be ignored when disabled"
    );
    Ok(())
}

/// Local commit that was never pushed makes the repository ahead
#[tokio::test]
async fn test_unpushed_commit_is_ahead() -> Result<()> {
    let upstream = Upstream::new()?;
    let root = ConfigRoot::new()?;
    let repo = TestRepo::clone_into(&upstream, root.path(), "alpha-kustomization")?;

    repo.add_commit("prod/overlays/kustomization.yaml", "images: []\n", "Local only")?;
    let status = prober().probe(repo.path()).await;

    assert!(!status.is_dirty);
    assert!(status.is_ahead);
    assert_eq!(status.upstream, UpstreamState::Tracking);
    assert_eq!(prober().ahead_count(repo.path()).await?, 1);
    Ok(())
}

/// Branch without upstream is reported as missing and not ahead
#[tokio::test]
async fn test_branch_without_upstream() -> Result<()> {
    let root = ConfigRoot::new()?;
    let repo = TestRepo::init_local(root.path(), "local-kustomization")?;

    let status = prober().probe(repo.path()).await;

    assert!(!status.is_dirty);
    assert!(!status.is_ahead);
    assert_eq!(status.upstream, UpstreamState::Missing);
    assert!(!status.has_changes());
    Ok(())
}

/// Missing upstream is recognized even when the user's locale is not English
#[cfg(unix)]
#[tokio::test]
async fn test_missing_upstream_ignores_user_locale() -> Result<()> {
    let root = ConfigRoot::new()?;
    let repo = TestRepo::init_local(root.path(), "local-kustomization")?;

    // Clean status; rev-list answers in Italian unless run under the C locale
    let git = FakeGit::new(
        "case \"$1\" in\n  status) exit 0 ;;\nesac\nif [ \"$LC_ALL\" = C ]; then\n  echo \"fatal: no upstream configured for branch 'main'\" >&2\nelse\n  echo \"fatal: nessun upstream configurato per il branch 'main'\" >&2\nfi\nexit 128",
    )?;
    let prober = SyncProber::new(git.executor(), Duration::from_secs(10));

    let status = prober.probe(repo.path()).await;

    assert_eq!(status.upstream, UpstreamState::Missing);
    assert!(!status.has_changes());
    Ok(())
}

/// Plain folders and missing paths read as absent
#[tokio::test]
async fn test_non_repository_paths_are_absent() -> Result<()> {
    let root = ConfigRoot::new()?;
    let plain = root.path().join("notes");
    std::fs::create_dir(&plain)?;

    assert_eq!(prober().probe(&plain).await, SyncStatus::absent());
    assert_eq!(
        prober().probe(Path::new("/nonexistent/pinmatrix/repo")).await,
        SyncStatus::absent()
    );
    Ok(())
}
