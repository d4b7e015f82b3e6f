// ABOUTME: Project list parsing (repository URLs and virtual-project directives) and clone bootstrap
// One entry per line; malformed lines are reported with their line number and skipped

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::executor::GitExecutor;
use crate::models::{DeploymentKind, VirtualProject};

pub const DEFAULT_PROJECTS_FILE: &str = "progetti.txt";

const ALIAS_KEYWORD: &str = "as";

#[derive(Error, Debug)]
pub enum ProjectListError {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    #[error("Failed to read project list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to prepare clone destination {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a repository is cloned from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSource {
    /// http(s) URL
    Http(Url),
    /// `ssh://` URL or scp-like `git@host:path`
    Ssh(String),
    /// Existing directory on this machine
    LocalPath(PathBuf),
}

impl RepoSource {
    /// Classify a URL token from the project list
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err("empty repository URL".to_string());
        }

        if input.starts_with("https://") || input.starts_with("http://") {
            return Url::parse(input)
                .map(RepoSource::Http)
                .map_err(|e| format!("invalid URL '{}': {}", input, e));
        }

        if input.starts_with("ssh://") {
            Url::parse(input).map_err(|e| format!("invalid URL '{}': {}", input, e))?;
            return Ok(RepoSource::Ssh(input.to_string()));
        }

        if let Some(rest) = input.strip_prefix("git@") {
            return match rest.split_once(':') {
                Some((host, path)) if !host.is_empty() && !path.is_empty() => {
                    Ok(RepoSource::Ssh(input.to_string()))
                }
                _ => Err(format!("invalid SSH address '{}'", input)),
            };
        }

        let path = PathBuf::from(input);
        if path.is_dir() {
            return Ok(RepoSource::LocalPath(path));
        }

        Err(format!("unrecognized repository source '{}'", input))
    }

    /// Argument handed to `git clone`
    pub fn clone_url(&self) -> String {
        match self {
            RepoSource::Http(url) => url.to_string(),
            RepoSource::Ssh(url) => url.clone(),
            RepoSource::LocalPath(path) => path.display().to_string(),
        }
    }

    /// Folder a clone lands in: the last path segment without `.git`
    pub fn default_folder(&self) -> Option<String> {
        let last = match self {
            RepoSource::Http(url) => url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string),
            RepoSource::Ssh(address) => {
                let path = match address.strip_prefix("ssh://") {
                    Some(rest) => rest.split_once('/').map(|(_, p)| p),
                    None => address.split_once(':').map(|(_, p)| p),
                };
                path.and_then(|p| p.trim_end_matches('/').rsplit('/').next())
                    .map(str::to_string)
            }
            RepoSource::LocalPath(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string),
        }?;

        let folder = last.strip_suffix(".git").unwrap_or(last.as_str()).to_string();
        is_valid_folder(&folder).then_some(folder)
    }
}

/// One meaningful line of the project list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectEntry {
    Clone { source: RepoSource, folder: String },
    Virtual(VirtualProject),
}

#[derive(Debug, Default)]
pub struct ProjectList {
    pub entries: Vec<ProjectEntry>,
    /// Skipped lines
    pub errors: Vec<ProjectListError>,
}

impl ProjectList {
    pub fn parse(content: &str) -> Self {
        let mut list = ProjectList::default();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Ok(entry) => list.entries.push(entry),
                Err(reason) => {
                    let err = ProjectListError::Malformed {
                        line: index + 1,
                        reason,
                    };
                    warn!("Skipping project list entry: {}", err);
                    list.errors.push(err);
                }
            }
        }

        debug!(
            "Parsed project list: {} entries, {} skipped",
            list.entries.len(),
            list.errors.len()
        );
        list
    }

    pub fn load(path: &Path) -> Result<Self, ProjectListError> {
        let content = fs::read_to_string(path).map_err(|source| ProjectListError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    pub fn virtual_projects(&self) -> Vec<VirtualProject> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                ProjectEntry::Virtual(mapping) => Some(mapping.clone()),
                ProjectEntry::Clone { .. } => None,
            })
            .collect()
    }
}

fn parse_line(line: &str) -> Result<ProjectEntry, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if let Some(directive) = tokens[0].strip_prefix('@') {
        let kind = DeploymentKind::parse(directive)
            .ok_or_else(|| format!("unknown directive '@{}'", directive))?;

        return match tokens.as_slice() {
            [_, folder, keyword, project] if *keyword == ALIAS_KEYWORD => {
                if !is_valid_folder(folder) {
                    return Err(format!("invalid folder name '{}'", folder));
                }
                Ok(ProjectEntry::Virtual(VirtualProject {
                    folder: (*folder).to_string(),
                    project: (*project).to_string(),
                    kind,
                }))
            }
            _ => Err(format!("expected '@{} <folder> as <project>'", directive)),
        };
    }

    let (url, folder) = match tokens.as_slice() {
        [url] => (*url, None),
        [url, keyword, folder] if *keyword == ALIAS_KEYWORD => (*url, Some(*folder)),
        _ => return Err("expected '<url>' or '<url> as <folder>'".to_string()),
    };

    let source = RepoSource::parse(url)?;
    let folder = match folder {
        Some(folder) if is_valid_folder(folder) => folder.to_string(),
        Some(folder) => return Err(format!("invalid folder name '{}'", folder)),
        None => source
            .default_folder()
            .ok_or_else(|| format!("cannot derive a folder name from '{}'", url))?,
    };

    Ok(ProjectEntry::Clone { source, folder })
}

fn is_valid_folder(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneStatus {
    Cloned,
    AlreadyPresent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloneOutcome {
    pub folder: String,
    pub url: String,
    pub status: CloneStatus,
    pub message: String,
}

/// Clone every listed repository whose folder is missing under `dest`.
///
/// Clones run one after another. A failed clone is recorded and the rest continue.
pub async fn clone_missing(
    executor: &GitExecutor,
    dest: &Path,
    entries: &[ProjectEntry],
) -> Result<Vec<CloneOutcome>, ProjectListError> {
    fs::create_dir_all(dest).map_err(|source| ProjectListError::Destination {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut outcomes = Vec::new();

    for entry in entries {
        let ProjectEntry::Clone { source, folder } = entry else {
            continue;
        };

        let url = source.clone_url();
        let target = dest.join(folder);

        if target.exists() {
            debug!("Skipping {}: {} already exists", url, target.display());
            outcomes.push(CloneOutcome {
                folder: folder.clone(),
                url,
                status: CloneStatus::AlreadyPresent,
                message: "already present".to_string(),
            });
            continue;
        }

        info!("Cloning {} into {}", url, target.display());
        let outcome = match executor
            .run_checked(dest, &["clone", url.as_str(), folder.as_str()], None)
            .await
        {
            Ok(_) => CloneOutcome {
                folder: folder.clone(),
                url,
                status: CloneStatus::Cloned,
                message: "cloned".to_string(),
            },
            Err(e) => {
                warn!("Clone of {} failed: {}", url, e);
                CloneOutcome {
                    folder: folder.clone(),
                    url,
                    status: CloneStatus::Failed,
                    message: e.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
