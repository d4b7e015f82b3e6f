// ABOUTME: Behavioral tests for sync sessions and the version matrix built on top of them
// Sessions freeze status at creation; a fresh session sees edits made since

use anyhow::Result;
use pretty_assertions::assert_eq;

use pinmatrix::config::{DisplayConfig, LayoutConfig, SyncConfig};
use pinmatrix::git::UpstreamState;
use pinmatrix::matrix::rows::filter_kind;
use pinmatrix::matrix::{load_rows, Pin, VersionMatrix};
use pinmatrix::models::{DeploymentKind, RepositoryKind, VirtualProject};
use pinmatrix::sync::SyncEngine;

use super::fixtures::{base_yaml, main_tf, overlay_yaml, ConfigRoot, TestRepo, Upstream};

fn kustomize_upstream() -> Result<Upstream> {
    Upstream::with_files(&[
        ("dev/overlays/kustomization.yaml", overlay_yaml("1.4.0-rc1").as_str()),
        ("dev/base/kustomization.yaml", base_yaml("0.9.0").as_str()),
        ("prod/overlays/kustomization.yaml", overlay_yaml("1.3.2").as_str()),
        ("prod/base/kustomization.yaml", base_yaml("0.8.1").as_str()),
    ])
}

fn terraform_upstream() -> Result<Upstream> {
    Upstream::with_files(&[
        ("environments/prod/main.tf", main_tf("v2.1.0").as_str()),
        ("environments/stage/main.tf", main_tf("v2.2.0").as_str()),
    ])
}

fn engine() -> SyncEngine {
    SyncEngine::new(&SyncConfig::default())
}

/// Clean checkout reads as unchanged until an overlay is edited
#[tokio::test]
async fn test_edit_shows_up_in_next_session_only() -> Result<()> {
    let upstream = kustomize_upstream()?;
    let root = ConfigRoot::new()?;
    let repo = TestRepo::clone_into(&upstream, root.path(), "alpha-kustomization")?;

    let before = engine().begin_session(root.path(), true).await;
    assert!(!before.has_changes(repo.path()));
    assert!(!before.pull_failed(repo.path()));
    assert_eq!(before.status(repo.path()).upstream, UpstreamState::Tracking);

    let descriptors = RepositoryKind::Kustomize {
        project: "alpha".to_string(),
    }
    .descriptors(repo.path(), "prod");
    Pin::Image.apply(&descriptors, "1.4.0")?;

    // The earlier session is frozen
    assert!(!before.has_changes(repo.path()));

    let after = engine().begin_session(root.path(), false).await;
    assert!(after.has_changes(repo.path()));
    assert_eq!(after.changed_repositories().len(), 1);
    assert!(after.pull_report().is_none());

    let rows = load_rows(&after, &LayoutConfig::default(), &[]);
    let prod = rows
        .iter()
        .find(|r| r.environment == "prod")
        .expect("prod row");
    assert_eq!(prod.image_tag.as_deref(), Some("1.4.0"));
    assert_eq!(prod.chart_version.as_deref(), Some("0.8.1"));
    assert!(prod.has_changes);
    Ok(())
}

/// Publishing the edit makes the repository clean again
#[tokio::test]
async fn test_commit_clears_changes() -> Result<()> {
    let upstream = kustomize_upstream()?;
    let root = ConfigRoot::new()?;
    let repo = TestRepo::clone_into(&upstream, root.path(), "alpha-kustomization")?;

    let descriptors = RepositoryKind::Kustomize {
        project: "alpha".to_string(),
    }
    .descriptors(repo.path(), "dev");
    Pin::Chart.apply(&descriptors, "0.9.1")?;

    let engine = engine();
    let dirty = engine.begin_session(root.path(), false).await;
    assert!(dirty.has_changes(repo.path()));

    let result = engine
        .commit_and_push(Some(&dirty), repo.path(), "Bump alpha chart in dev")
        .await;
    assert!(result.ok, "commit failed: {}", result.message);

    let clean = engine.begin_session(root.path(), true).await;
    assert!(!clean.has_changes(repo.path()));
    assert_eq!(upstream.head_subject()?, "Bump alpha chart in dev");
    Ok(())
}

/// Kustomize and Terraform repositories of one project share matrix cells
#[tokio::test]
async fn test_matrix_combines_repository_kinds() -> Result<()> {
    let kustomize = kustomize_upstream()?;
    let terraform = terraform_upstream()?;
    let root = ConfigRoot::new()?;
    TestRepo::clone_into(&kustomize, root.path(), "alpha-kustomization")?;
    TestRepo::clone_into(&terraform, root.path(), "alpha-config-prod")?;
    std::fs::create_dir(root.path().join("notes"))?;

    let session = engine().begin_session(root.path(), false).await;
    let rows = load_rows(&session, &LayoutConfig::default(), &[]);
    assert_eq!(rows.len(), 4, "notes is not a config repository");

    let matrix = VersionMatrix::build(rows.clone(), &DisplayConfig::default().environment_priority);
    assert_eq!(matrix.projects(), vec!["alpha"]);
    assert_eq!(matrix.environments(), ["dev", "stage", "prod"]);

    let prod = matrix.cell("alpha", "prod").expect("prod cell");
    assert_eq!(prod.rows.len(), 2);
    assert!(!prod.has_changes);
    let terraform_row = prod
        .rows
        .iter()
        .find(|r| r.kind == DeploymentKind::Terraform)
        .expect("terraform row");
    assert_eq!(terraform_row.terraform_ref.as_deref(), Some("v2.1.0"));

    let terraform_only = filter_kind(rows, Some(DeploymentKind::Terraform));
    assert_eq!(terraform_only.len(), 2);
    assert!(terraform_only.iter().all(|r| r.repo_folder == "alpha-config-prod"));
    Ok(())
}

/// Virtual mappings classify folders the naming rules do not recognize
#[tokio::test]
async fn test_virtual_project_mapping() -> Result<()> {
    let terraform = terraform_upstream()?;
    let root = ConfigRoot::new()?;
    TestRepo::clone_into(&terraform, root.path(), "legacy-infra")?;

    let session = engine().begin_session(root.path(), false).await;
    assert!(load_rows(&session, &LayoutConfig::default(), &[]).is_empty());

    let mapping = VirtualProject {
        folder: "legacy-infra".to_string(),
        project: "billing".to_string(),
        kind: DeploymentKind::Terraform,
    };
    let rows = load_rows(&session, &LayoutConfig::default(), &[mapping]);

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.project == "billing"));
    let stage = rows.iter().find(|r| r.environment == "stage").expect("stage");
    assert_eq!(stage.terraform_ref.as_deref(), Some("v2.2.0"));
    Ok(())
}
