// ABOUTME: Per-invocation application context: config, settings, resolved root and sync engine

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::audit::{self, AuditResult, AuditTrigger};
use crate::config::settings::SettingsUpdate;
use crate::config::{AppConfig, Settings};
use crate::models::VirtualProject;
use crate::sync::{SyncEngine, SyncSession};

pub struct AppContext {
    pub config: AppConfig,
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub root: PathBuf,
    pub engine: SyncEngine,
}

impl AppContext {
    /// Load config and settings from their default locations
    pub fn load(cli_root: Option<PathBuf>) -> Result<Self> {
        let config = AppConfig::load()?;
        let settings_path = Settings::default_path()?;
        let settings = Settings::load(&settings_path);
        let remember_root = cli_root.is_some();

        let ctx = Self::from_parts(config, settings, settings_path, cli_root)?;
        if remember_root {
            ctx.remember(
                SettingsUpdate {
                    root_dir: Some(ctx.root.clone()),
                    ..Default::default()
                },
                "root",
            );
        }
        Ok(ctx)
    }

    pub fn from_parts(
        config: AppConfig,
        settings: Settings,
        settings_path: PathBuf,
        cli_root: Option<PathBuf>,
    ) -> Result<Self> {
        let root = resolve_root(cli_root.as_deref(), &settings, &config)?;
        debug!("Using configuration root {}", root.display());

        Ok(Self {
            engine: SyncEngine::new(&config.sync),
            config,
            settings,
            settings_path,
            root,
        })
    }

    /// Pull before reading unless disabled on the command line or in config
    pub fn should_pull(&self, no_pull: bool) -> bool {
        !no_pull && self.config.sync.pull_on_start
    }

    pub async fn session(&self, pull: bool) -> SyncSession {
        self.engine.begin_session(&self.root, pull).await
    }

    pub fn virtual_projects(&self) -> &[VirtualProject] {
        &self.settings.virtual_projects
    }

    /// Persist a settings change. Failures are logged, never fatal.
    pub fn remember(&self, update: SettingsUpdate, command: &str) {
        let result = match Settings::update(&self.settings_path, update) {
            Ok(_) => AuditResult::Success,
            Err(e) => {
                warn!("Failed to save settings: {:#}", e);
                AuditResult::Failed(e.to_string())
            }
        };
        audit::audit_settings_saved(
            &self.settings_path,
            AuditTrigger::Command(command.to_string()),
            result,
        );
    }
}

/// Root directory: `--root`, then the remembered root, then the configured one.
///
/// Always absolute, so a remembered root still resolves from another working directory.
pub fn resolve_root(
    cli_root: Option<&Path>,
    settings: &Settings,
    config: &AppConfig,
) -> Result<PathBuf> {
    let root = cli_root
        .map(Path::to_path_buf)
        .or_else(|| settings.root_dir.clone())
        .or_else(|| config.root_dir.clone())
        .map(|root| expand_tilde(&root))
        .ok_or_else(|| {
            anyhow!(
                "No root directory configured. Pass --root <dir> or set root_dir in ~/.pinmatrix/config.toml"
            )
        })?;

    std::path::absolute(&root)
        .with_context(|| format!("Failed to resolve root directory {}", root.display()))
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}
