// ABOUTME: Configuration management for pinmatrix
// TOML application config layered from the user and project directories, plus JSON settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod settings;

pub use settings::Settings;

const CONFIG_DIR_NAME: &str = ".pinmatrix";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the configuration repositories
    #[serde(default)]
    pub root_dir: Option<PathBuf>,

    /// Project list used by `clone`; relative paths resolve against the root's parent
    #[serde(default = "default_projects_file")]
    pub projects_file: PathBuf,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upper bound on concurrent pulls and probes
    #[serde(default = "default_pull_workers")]
    pub pull_workers: usize,

    #[serde(default = "default_timeout_secs")]
    pub pull_timeout_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Whether untracked files make a repository dirty
    #[serde(default = "default_true")]
    pub count_untracked_as_dirty: bool,

    /// Pull every repository before building a session
    #[serde(default = "default_true")]
    pub pull_on_start: bool,
}

impl SyncConfig {
    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pull_workers: default_pull_workers(),
            pull_timeout_secs: default_timeout_secs(),
            probe_timeout_secs: default_timeout_secs(),
            count_untracked_as_dirty: default_true(),
            pull_on_start: default_true(),
        }
    }
}

/// Folder naming convention for configuration repositories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_kustomize_suffix")]
    pub kustomize_suffix: String,

    #[serde(default = "default_terraform_infix")]
    pub terraform_infix: String,

    #[serde(default = "default_chart_suffix")]
    pub chart_suffix: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            kustomize_suffix: default_kustomize_suffix(),
            terraform_infix: default_terraform_infix(),
            chart_suffix: default_chart_suffix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Environments shown first in the matrix, in this order
    #[serde(default = "default_environment_priority")]
    pub environment_priority: Vec<String>,

    /// Column width for text tables
    #[serde(default = "default_truncate_width")]
    pub truncate_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            environment_priority: default_environment_priority(),
            truncate_width: default_truncate_width(),
        }
    }
}

fn default_projects_file() -> PathBuf {
    PathBuf::from(crate::git::project_list::DEFAULT_PROJECTS_FILE)
}

fn default_pull_workers() -> usize {
    crate::git::puller::DEFAULT_PULL_WORKERS
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_kustomize_suffix() -> String {
    "-kustomization".to_string()
}

fn default_terraform_infix() -> String {
    "-config-".to_string()
}

fn default_chart_suffix() -> String {
    "-chart".to_string()
}

fn default_environment_priority() -> Vec<String> {
    ["dev", "test", "testinfra", "stage", "prod"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_truncate_width() -> usize {
    15
}

impl AppConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_paths())
    }

    /// Load and merge the given files in order; missing files are skipped.
    ///
    /// Keys a later file sets override earlier files, even when set back to the default.
    pub fn load_from(paths: &[PathBuf]) -> Result<Self> {
        let mut merged = toml::Table::new();

        for path in paths {
            if path.exists() {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config from {}", path.display()))?;

                let table: toml::Table = toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config from {}", path.display()))?;

                tracing::debug!("Loaded config from {}", path.display());
                merge_tables(&mut merged, table);
            }
        }

        toml::Value::Table(merged)
            .try_into()
            .context("Failed to parse merged config")
    }

    /// Configuration file paths, lowest precedence first
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        // 1. User config (~/.pinmatrix/config.toml)
        if let Ok(config_dir) = Self::get_user_config_dir() {
            paths.push(config_dir.join(CONFIG_FILE_NAME));
        }

        // 2. Local project config
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
        }

        paths
    }

    /// User configuration directory (`~/.pinmatrix`)
    pub fn get_user_config_dir() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home_dir.join(CONFIG_DIR_NAME))
    }

    /// Project list location for `root`
    pub fn projects_file_for(&self, root: &Path) -> PathBuf {
        if self.projects_file.is_absolute() {
            return self.projects_file.clone();
        }
        root.parent()
            .unwrap_or(root)
            .join(&self.projects_file)
    }
}

/// Overlay `other` onto `base`; nested tables merge key by key
fn merge_tables(base: &mut toml::Table, other: toml::Table) {
    for (key, value) in other {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_dir: None,
            projects_file: default_projects_file(),
            sync: SyncConfig::default(),
            layout: LayoutConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}
