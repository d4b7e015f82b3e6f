// ABOUTME: Behavioral tests for parallel pulls across a configuration root
// Verifies one outcome per folder, update detection, failure isolation and bounded time

use anyhow::Result;
use pretty_assertions::assert_eq;
use std::time::Duration;

use pinmatrix::git::{GitExecutor, ParallelPuller};

#[cfg(unix)]
use super::fixtures::FakeGit;
use super::fixtures::{ConfigRoot, TestRepo, Upstream};

fn puller(workers: usize, timeout_secs: u64) -> ParallelPuller {
    ParallelPuller::new(
        GitExecutor::new(),
        workers,
        Duration::from_secs(timeout_secs),
    )
}

/// Every folder gets exactly one outcome, repositories or not
#[tokio::test]
async fn test_one_outcome_per_folder() -> Result<()> {
    let upstream = Upstream::new()?;
    let root = ConfigRoot::new()?;
    TestRepo::clone_into(&upstream, root.path(), "alpha-kustomization")?;
    TestRepo::clone_into(&upstream, root.path(), "beta-kustomization")?;
    std::fs::create_dir(root.path().join("notes"))?;
    std::fs::write(root.path().join("progetti.txt"), "")?;

    let report = puller(2, 30).pull_all(root.path()).await;

    assert_eq!(report.len(), 3, "files are not pulled, folders are");
    assert_eq!(report.succeeded_count(), 2);
    assert_eq!(report.failures().len(), 1);
    assert!(report.failures()[0].repo_path.ends_with("notes"));
    Ok(())
}

/// A new upstream commit is reported as an update, a second pull is not
#[tokio::test]
async fn test_pull_detects_updates() -> Result<()> {
    let upstream = Upstream::new()?;
    let root = ConfigRoot::new()?;
    let repo = TestRepo::clone_into(&upstream, root.path(), "alpha-kustomization")?;

    upstream.push_commit("CHANGELOG.md", "v2\n", "Release v2")?;

    let first = puller(4, 30).pull_all(root.path()).await;
    let outcome = first.get(repo.path()).expect("outcome for clone");
    assert!(outcome.succeeded, "pull failed: {}", outcome.message);
    assert!(outcome.updated);
    assert!(repo.path().join("CHANGELOG.md").exists());

    let second = puller(4, 30).pull_all(root.path()).await;
    let outcome = second.get(repo.path()).expect("outcome for clone");
    assert!(outcome.succeeded);
    assert!(!outcome.updated);
    Ok(())
}

/// Diverged history cannot fast-forward: that repository fails, others still pull
#[tokio::test]
async fn test_failure_is_isolated() -> Result<()> {
    let upstream = Upstream::new()?;
    let root = ConfigRoot::new()?;
    let diverged = TestRepo::clone_into(&upstream, root.path(), "alpha-kustomization")?;
    let healthy = TestRepo::clone_into(&upstream, root.path(), "beta-kustomization")?;

    upstream.push_commit("CHANGELOG.md", "upstream\n", "Upstream change")?;
    diverged.add_commit("LOCAL.md", "local\n", "Local change")?;

    let report = puller(4, 30).pull_all(root.path()).await;

    let failed = report.get(diverged.path()).expect("outcome for diverged");
    assert!(!failed.succeeded);
    assert!(!failed.message.is_empty());

    let pulled = report.get(healthy.path()).expect("outcome for healthy");
    assert!(pulled.succeeded);
    assert!(pulled.updated);
    Ok(())
}

/// Stand-in for git: sleeps in folders named hang-*, succeeds elsewhere
#[cfg(unix)]
const HANGING_PULL: &str =
    "case \"$(basename \"$PWD\")\" in\n  hang-*) sleep 30 ;;\nesac\necho 'Already up to date.'";

/// Hanging pulls are cut off at the timeout instead of blocking the batch
#[cfg(unix)]
#[tokio::test]
async fn test_hanging_pull_times_out() -> Result<()> {
    use std::time::Instant;

    let root = ConfigRoot::new()?;
    for name in ["hang-one", "hang-two", "fast-one", "fast-two"] {
        std::fs::create_dir(root.path().join(name))?;
    }

    let git = FakeGit::new(HANGING_PULL)?;
    let puller = ParallelPuller::new(git.executor(), 4, Duration::from_secs(1));

    let started = Instant::now();
    let report = puller.pull_all(root.path()).await;
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(10), "took {elapsed:?}");
    assert_eq!(report.len(), 4);
    assert_eq!(report.succeeded_count(), 2);
    for failure in report.failures() {
        let name = failure.repo_path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("hang-"), "unexpected failure: {name}");
        assert!(failure.message.contains("timed out"), "{}", failure.message);
    }
    Ok(())
}

/// More repositories than workers: hanging pulls run in waves of the pool size
#[cfg(unix)]
#[tokio::test]
async fn test_pool_bounds_total_time() -> Result<()> {
    use std::time::Instant;

    let root = ConfigRoot::new()?;
    for index in 0..6 {
        std::fs::create_dir(root.path().join(format!("hang-{index}")))?;
    }

    let git = FakeGit::new(HANGING_PULL)?;
    let puller = ParallelPuller::new(git.executor(), 2, Duration::from_secs(1));

    let started = Instant::now();
    let report = puller.pull_all(root.path()).await;
    let elapsed = started.elapsed();

    // Three waves of one timeout each, not six sequential timeouts
    assert!(elapsed >= Duration::from_secs(2), "took {elapsed:?}");
    assert!(elapsed < Duration::from_secs(6), "took {elapsed:?}");
    assert_eq!(report.len(), 6);
    assert_eq!(report.failures().len(), 6);
    Ok(())
}

/// Up-to-date detection does not depend on the user's locale
#[cfg(unix)]
#[tokio::test]
async fn test_up_to_date_detection_ignores_user_locale() -> Result<()> {
    let root = ConfigRoot::new()?;
    std::fs::create_dir(root.path().join("alpha-kustomization"))?;

    // Answers in Italian unless git is run under the C locale
    let git = FakeGit::new(
        "if [ \"$LC_ALL\" = C ]; then echo 'Already up to date.'; else echo 'Già aggiornato.'; fi",
    )?;
    let puller = ParallelPuller::new(git.executor(), 2, Duration::from_secs(10));

    let report = puller.pull_all(root.path()).await;
    let outcome = report
        .get(&root.path().join("alpha-kustomization"))
        .expect("outcome");

    assert!(outcome.succeeded);
    assert!(!outcome.updated);
    Ok(())
}
