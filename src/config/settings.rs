// ABOUTME: Persisted user settings (root directory, last selections, virtual projects) as JSON
// A missing or malformed settings file falls back to defaults instead of failing startup

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::AppConfig;
use crate::models::{DeploymentKind, VirtualProject};

const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub root_dir: Option<PathBuf>,

    /// Deployment kind filter applied to the matrix
    #[serde(default)]
    pub last_provider: Option<DeploymentKind>,

    #[serde(default)]
    pub last_proj: Option<String>,

    #[serde(default)]
    pub last_env: Option<String>,

    #[serde(default)]
    pub virtual_projects: Vec<VirtualProject>,
}

/// Partial settings change; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub root_dir: Option<PathBuf>,
    pub last_provider: Option<DeploymentKind>,
    pub last_proj: Option<String>,
    pub last_env: Option<String>,
}

impl Settings {
    /// Default settings location (`~/.pinmatrix/settings.json`)
    pub fn default_path() -> Result<PathBuf> {
        Ok(AppConfig::get_user_config_dir()?.join(SETTINGS_FILE_NAME))
    }

    /// Read settings from `path`. Missing or unreadable files yield defaults.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No settings at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Ignoring malformed settings file {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(root_dir) = update.root_dir {
            self.root_dir = Some(root_dir);
        }
        if let Some(provider) = update.last_provider {
            self.last_provider = Some(provider);
        }
        if let Some(project) = update.last_proj {
            self.last_proj = Some(project);
        }
        if let Some(env) = update.last_env {
            self.last_env = Some(env);
        }
    }

    /// Load, merge `update` over the stored values, and rewrite the file
    pub fn update(path: &Path, update: SettingsUpdate) -> Result<Self> {
        let mut settings = Self::load(path);
        settings.apply(update);
        settings.save(path)?;
        Ok(settings)
    }

    /// Add or replace virtual projects, keyed by folder name. Returns how many changed.
    pub fn merge_virtual_projects(&mut self, mappings: &[VirtualProject]) -> usize {
        let mut changed = 0;

        for mapping in mappings {
            match self
                .virtual_projects
                .iter_mut()
                .find(|existing| existing.folder == mapping.folder)
            {
                Some(existing) if existing == mapping => {}
                Some(existing) => {
                    *existing = mapping.clone();
                    changed += 1;
                }
                None => {
                    self.virtual_projects.push(mapping.clone());
                    changed += 1;
                }
            }
        }

        changed
    }
}
