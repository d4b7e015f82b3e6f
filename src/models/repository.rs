// ABOUTME: Repository handles and deployment-kind classification with per-kind path rules

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LayoutConfig;

const KUSTOMIZATION_FILE: &str = "kustomization.yaml";
const OVERLAYS_DIR: &str = "overlays";
const BASE_DIR: &str = "base";
const TERRAFORM_ENVIRONMENTS_DIR: &str = "environments";
const TERRAFORM_MAIN_FILE: &str = "main.tf";

/// One on-disk checkout under the configuration root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryHandle {
    pub path: PathBuf,
}

impl RepositoryHandle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Folder name of the checkout
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
    }
}

/// Deployment convention tag, used where the project name is not known yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentKind {
    Kustomize,
    Terraform,
}

impl DeploymentKind {
    pub fn label(self) -> &'static str {
        match self {
            DeploymentKind::Kustomize => "Kustomize",
            DeploymentKind::Terraform => "Terraform",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kustomize" => Some(DeploymentKind::Kustomize),
            "terraform" => Some(DeploymentKind::Terraform),
            _ => None,
        }
    }
}

/// Folder that does not follow the naming convention but should be shown as a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualProject {
    pub folder: String,
    pub project: String,
    pub kind: DeploymentKind,
}

/// Classified deployment-configuration repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryKind {
    Kustomize { project: String },
    Terraform { project: String },
}

/// Descriptor files of one environment inside a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentDescriptors {
    Kustomize { overlay: PathBuf, base: PathBuf },
    Terraform { main_tf: PathBuf },
}

impl EnvironmentDescriptors {
    /// The file an editor opens first for this environment
    pub fn primary(&self) -> &Path {
        match self {
            EnvironmentDescriptors::Kustomize { overlay, .. } => overlay,
            EnvironmentDescriptors::Terraform { main_tf } => main_tf,
        }
    }
}

impl RepositoryKind {
    /// Classify a folder name. Virtual mappings take precedence over naming rules.
    pub fn classify(
        folder_name: &str,
        layout: &LayoutConfig,
        virtual_projects: &[VirtualProject],
    ) -> Option<Self> {
        if let Some(mapping) = virtual_projects.iter().find(|v| v.folder == folder_name) {
            return Some(Self::from_parts(mapping.kind, mapping.project.clone()));
        }

        if let Some(project) = folder_name.strip_suffix(layout.kustomize_suffix.as_str()) {
            if !project.is_empty() {
                return Some(RepositoryKind::Kustomize {
                    project: project.to_string(),
                });
            }
        }

        if let Some((project, _)) = folder_name.split_once(layout.terraform_infix.as_str()) {
            if !project.is_empty() {
                return Some(RepositoryKind::Terraform {
                    project: project.to_string(),
                });
            }
        }

        None
    }

    pub fn from_parts(kind: DeploymentKind, project: String) -> Self {
        match kind {
            DeploymentKind::Kustomize => RepositoryKind::Kustomize { project },
            DeploymentKind::Terraform => RepositoryKind::Terraform { project },
        }
    }

    pub fn project(&self) -> &str {
        match self {
            RepositoryKind::Kustomize { project } | RepositoryKind::Terraform { project } => {
                project
            }
        }
    }

    pub fn deployment_kind(&self) -> DeploymentKind {
        match self {
            RepositoryKind::Kustomize { .. } => DeploymentKind::Kustomize,
            RepositoryKind::Terraform { .. } => DeploymentKind::Terraform,
        }
    }

    /// Descriptor paths for `env` inside `repo_path`, whether or not they exist
    pub fn descriptors(&self, repo_path: &Path, env: &str) -> EnvironmentDescriptors {
        match self {
            RepositoryKind::Kustomize { .. } => {
                let env_dir = repo_path.join(env);
                EnvironmentDescriptors::Kustomize {
                    overlay: env_dir.join(OVERLAYS_DIR).join(KUSTOMIZATION_FILE),
                    base: env_dir.join(BASE_DIR).join(KUSTOMIZATION_FILE),
                }
            }
            RepositoryKind::Terraform { .. } => EnvironmentDescriptors::Terraform {
                main_tf: repo_path
                    .join(TERRAFORM_ENVIRONMENTS_DIR)
                    .join(env)
                    .join(TERRAFORM_MAIN_FILE),
            },
        }
    }

    /// Environment names present in `repo_path`, sorted.
    ///
    /// Kustomize environments are subfolders holding an `overlays` directory;
    /// Terraform environments are `environments/<env>` folders holding `main.tf`.
    pub fn environments(&self, repo_path: &Path) -> Vec<String> {
        let (scan_dir, marker): (PathBuf, &str) = match self {
            RepositoryKind::Kustomize { .. } => (repo_path.to_path_buf(), OVERLAYS_DIR),
            RepositoryKind::Terraform { .. } => (
                repo_path.join(TERRAFORM_ENVIRONMENTS_DIR),
                TERRAFORM_MAIN_FILE,
            ),
        };

        let Ok(entries) = fs::read_dir(&scan_dir) else {
            return Vec::new();
        };

        let mut envs: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter(|entry| entry.path().join(marker).exists())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();

        envs.sort();
        envs
    }
}
