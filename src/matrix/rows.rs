// ABOUTME: Project x environment rows derived from a sync session, and their pivot into a matrix

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::debug;

use super::descriptors::{read_chart_version, read_image_tag, read_terraform_ref};
use crate::config::LayoutConfig;
use crate::models::{DeploymentKind, EnvironmentDescriptors, RepositoryKind, VirtualProject};
use crate::sync::SyncSession;

/// One environment of one project in one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectEnvironmentRow {
    pub project: String,
    pub environment: String,
    pub kind: DeploymentKind,
    pub repo_folder: String,
    pub repo_path: PathBuf,
    /// File opened by `edit`
    pub descriptor: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform_ref: Option<String>,
    pub has_changes: bool,
}

impl ProjectEnvironmentRow {
    /// Compact cell text, each value cut to `width` characters
    pub fn summary(&self, width: usize) -> String {
        match self.kind {
            DeploymentKind::Kustomize => format!(
                "app:{} chart:{}",
                shorten(self.image_tag.as_deref(), width),
                shorten(self.chart_version.as_deref(), width)
            ),
            DeploymentKind::Terraform => {
                format!("tf:{}", shorten(self.terraform_ref.as_deref(), width))
            }
        }
    }
}

fn shorten(value: Option<&str>, width: usize) -> String {
    match value {
        Some(v) => v.chars().take(width).collect(),
        None => "-".to_string(),
    }
}

/// Walk the session's repositories in name order and read every environment's pins
pub fn load_rows(
    session: &SyncSession,
    layout: &LayoutConfig,
    virtual_projects: &[VirtualProject],
) -> Vec<ProjectEnvironmentRow> {
    let mut rows = Vec::new();

    for handle in session.repositories() {
        let Some(kind) = RepositoryKind::classify(handle.name(), layout, virtual_projects) else {
            continue;
        };

        let has_changes = session.has_changes(&handle.path);

        for environment in kind.environments(&handle.path) {
            let descriptors = kind.descriptors(&handle.path, &environment);
            let (image_tag, chart_version, terraform_ref) = match &descriptors {
                EnvironmentDescriptors::Kustomize { overlay, base } => {
                    (read_image_tag(overlay), read_chart_version(base), None)
                }
                EnvironmentDescriptors::Terraform { main_tf } => {
                    (None, None, read_terraform_ref(main_tf))
                }
            };

            rows.push(ProjectEnvironmentRow {
                project: kind.project().to_string(),
                environment,
                kind: kind.deployment_kind(),
                repo_folder: handle.name().to_string(),
                repo_path: handle.path.clone(),
                descriptor: descriptors.primary().to_path_buf(),
                image_tag,
                chart_version,
                terraform_ref,
                has_changes,
            });
        }
    }

    debug!("Loaded {} project/environment rows", rows.len());
    rows
}

/// Rows whose deployment kind matches `kind`; all rows when `None`
pub fn filter_kind(
    rows: Vec<ProjectEnvironmentRow>,
    kind: Option<DeploymentKind>,
) -> Vec<ProjectEnvironmentRow> {
    match kind {
        Some(kind) => rows.into_iter().filter(|r| r.kind == kind).collect(),
        None => rows,
    }
}

/// Every row for one (project, environment) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatrixCell {
    pub rows: Vec<ProjectEnvironmentRow>,
    /// Any contributing repository has uncommitted or unpushed work
    pub has_changes: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VersionMatrix {
    environments: Vec<String>,
    cells: BTreeMap<String, BTreeMap<String, MatrixCell>>,
}

impl VersionMatrix {
    /// Pivot `rows`; columns follow `priority`, then remaining environments alphabetically
    pub fn build(rows: Vec<ProjectEnvironmentRow>, priority: &[String]) -> Self {
        let present: BTreeSet<String> = rows.iter().map(|r| r.environment.clone()).collect();

        let mut environments: Vec<String> = priority
            .iter()
            .filter(|env| present.contains(*env))
            .cloned()
            .collect();
        environments.extend(
            present
                .into_iter()
                .filter(|env| !priority.contains(env)),
        );
        environments.dedup();

        let mut cells: BTreeMap<String, BTreeMap<String, MatrixCell>> = BTreeMap::new();
        for row in rows {
            let cell = cells
                .entry(row.project.clone())
                .or_default()
                .entry(row.environment.clone())
                .or_default();
            cell.has_changes |= row.has_changes;
            cell.rows.push(row);
        }

        Self {
            environments,
            cells,
        }
    }

    /// Column headers in display order
    pub fn environments(&self) -> &[String] {
        &self.environments
    }

    /// Row headers, sorted
    pub fn projects(&self) -> Vec<&str> {
        self.cells.keys().map(String::as_str).collect()
    }

    pub fn cell(&self, project: &str, environment: &str) -> Option<&MatrixCell> {
        self.cells.get(project).and_then(|envs| envs.get(environment))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
