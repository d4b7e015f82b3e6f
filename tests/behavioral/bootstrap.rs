// ABOUTME: Behavioral tests for bootstrapping a root from a project list
// Clones from local bare upstreams and records virtual-project directives in settings

use anyhow::Result;
use pretty_assertions::assert_eq;

use pinmatrix::config::Settings;
use pinmatrix::git::project_list::{clone_missing, CloneStatus, ProjectList};
use pinmatrix::git::{is_repository_root, GitExecutor};
use pinmatrix::models::DeploymentKind;

use super::fixtures::{ConfigRoot, Upstream};

/// Missing folders are cloned, present ones skipped, bad sources reported
#[tokio::test]
async fn test_clone_missing_from_project_list() -> Result<()> {
    let alpha = Upstream::new()?;
    let beta = Upstream::new()?;
    let root = ConfigRoot::new()?;
    std::fs::create_dir(root.path().join("beta-kustomization"))?;
    // Existing folder that is not a repository: parses, but the clone fails
    let not_a_repo = tempfile::TempDir::new()?;

    let content = format!(
        "# configuration repositories\n{} as alpha-kustomization\n{} as beta-kustomization\n{} as gamma-kustomization\n@terraform legacy-infra as billing\nnot a valid line at all\n",
        alpha.url(),
        beta.url(),
        not_a_repo.path().display(),
    );
    let list = ProjectList::parse(&content);
    assert_eq!(list.entries.len(), 4);
    assert_eq!(list.errors.len(), 1);

    let outcomes = clone_missing(&GitExecutor::new(), root.path(), &list.entries).await?;

    let statuses: Vec<(&str, CloneStatus)> = outcomes
        .iter()
        .map(|o| (o.folder.as_str(), o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("alpha-kustomization", CloneStatus::Cloned),
            ("beta-kustomization", CloneStatus::AlreadyPresent),
            ("gamma-kustomization", CloneStatus::Failed),
        ]
    );
    assert!(is_repository_root(&root.path().join("alpha-kustomization")));
    assert!(!root.path().join("gamma-kustomization").exists());
    Ok(())
}

/// Cloning again is a no-op
#[tokio::test]
async fn test_clone_is_idempotent() -> Result<()> {
    let alpha = Upstream::new()?;
    let root = ConfigRoot::new()?;
    let list = ProjectList::parse(&format!("{} as alpha-kustomization\n", alpha.url()));

    let first = clone_missing(&GitExecutor::new(), root.path(), &list.entries).await?;
    let second = clone_missing(&GitExecutor::new(), root.path(), &list.entries).await?;

    assert_eq!(first[0].status, CloneStatus::Cloned);
    assert_eq!(second[0].status, CloneStatus::AlreadyPresent);
    Ok(())
}

/// Virtual directives end up in the persisted settings exactly once
#[test]
fn test_virtual_projects_are_recorded_in_settings() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let settings_path = dir.path().join("settings.json");
    let list = ProjectList::parse(
        "@terraform legacy-infra as billing\n@kustomize old-deploy as billing\n",
    );

    let mut settings = Settings::load(&settings_path);
    assert_eq!(settings.merge_virtual_projects(&list.virtual_projects()), 2);
    settings.save(&settings_path)?;

    let mut reloaded = Settings::load(&settings_path);
    assert_eq!(reloaded.virtual_projects.len(), 2);
    assert_eq!(reloaded.virtual_projects[0].kind, DeploymentKind::Terraform);
    assert_eq!(reloaded.merge_virtual_projects(&list.virtual_projects()), 0);
    Ok(())
}
