// ABOUTME: Raw descriptor file access for the editor flow and Helm chart values lookup

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const VALUES_FILE: &str = "values.yaml";

#[derive(Error, Debug)]
pub enum FileError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Refusing to save {path}: invalid YAML: {source}")]
    InvalidYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("values.yaml not found in {0}")]
    ChartValuesNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Content matched what was on disk; nothing was written
    Unchanged,
}

/// Text of `path`, or an empty string when it does not exist
pub fn read_file_content(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

/// Overwrite `path` with `content`, ensuring a trailing newline.
///
/// Whitespace-only differences at either end count as unchanged. YAML files must
/// parse before anything is written.
pub fn save_file_content(path: &Path, content: &str) -> Result<SaveOutcome, FileError> {
    let existing = read_file_content(path);
    if path.exists() && existing.trim() == content.trim() {
        debug!("No changes to save for {}", path.display());
        return Ok(SaveOutcome::Unchanged);
    }

    if is_yaml(path) {
        validate_yaml(content).map_err(|source| FileError::InvalidYaml {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let mut content = content.to_string();
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }

    fs::write(path, content).map_err(|source| FileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Saved {}", path.display());
    Ok(SaveOutcome::Saved)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Every document in a (possibly multi-document) stream must parse
fn validate_yaml(content: &str) -> Result<(), serde_yaml::Error> {
    for document in serde_yaml::Deserializer::from_str(content) {
        serde_yaml::Value::deserialize(document)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartValues {
    pub path: PathBuf,
    pub content: String,
}

/// Locate `values.yaml` for `project` in its chart repository under `root`.
///
/// Tries `<project><suffix>/values.yaml`, then the standard Helm layout
/// `<project><suffix>/<project>/values.yaml`.
pub fn chart_values(root: &Path, project: &str, chart_suffix: &str) -> Result<ChartValues, FileError> {
    let chart_repo = format!("{}{}", project, chart_suffix);
    let candidates = [
        root.join(&chart_repo).join(VALUES_FILE),
        root.join(&chart_repo).join(project).join(VALUES_FILE),
    ];

    for path in candidates {
        if path.is_file() {
            let content = fs::read_to_string(&path).map_err(|source| FileError::Io {
                path: path.clone(),
                source,
            })?;
            return Ok(ChartValues { path, content });
        }
    }

    Err(FileError::ChartValuesNotFound(chart_repo))
}
