// ABOUTME: Reading and rewriting version pins inside deployment descriptors
// Kustomize pins live in YAML lists; Terraform pins in module source refs

use lazy_static::lazy_static;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::EnvironmentDescriptors;

/// Shown when a descriptor exists but its first entry lacks the pinned key
pub const NOT_AVAILABLE: &str = "N/A";
/// Shown when a `main.tf` has no tagged module source
pub const TERRAFORM_REF_NOT_FOUND: &str = "Not Found";

const IMAGES_KEY: &str = "images";
const NEW_TAG_KEY: &str = "newTag";
const HELM_CHARTS_KEY: &str = "helmCharts";
const VERSION_KEY: &str = "version";

lazy_static! {
    // Module source pinned to a tag: source = "...?ref=tags/<version>"
    static ref TERRAFORM_SOURCE_REF: Regex =
        Regex::new(r#"(source\s*=\s*".*\?ref=tags/)([^"]*)(")"#).unwrap();
}

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Missing '{key}' in {path}")]
    MissingKey { path: PathBuf, key: &'static str },
    #[error("Pattern 'source ... ?ref=tags/...' not found in {0}")]
    PatternNotFound(PathBuf),
    #[error("{pin} does not apply to {kind} descriptors")]
    WrongKind { pin: &'static str, kind: &'static str },
}

/// Which version pin of an environment to change
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Pin {
    /// Container image tag (Kustomize overlay)
    Image,
    /// Helm chart version (Kustomize base)
    Chart,
    /// Module source tag (Terraform)
    Ref,
}

impl Pin {
    pub fn label(self) -> &'static str {
        match self {
            Pin::Image => "image tag",
            Pin::Chart => "chart version",
            Pin::Ref => "terraform ref",
        }
    }

    /// Rewrite this pin in `descriptors`, returning the file that changed
    pub fn apply(
        self,
        descriptors: &EnvironmentDescriptors,
        value: &str,
    ) -> Result<PathBuf, DescriptorError> {
        match (self, descriptors) {
            (Pin::Image, EnvironmentDescriptors::Kustomize { overlay, .. }) => {
                update_image_tag(overlay, value)?;
                Ok(overlay.clone())
            }
            (Pin::Chart, EnvironmentDescriptors::Kustomize { base, .. }) => {
                update_chart_version(base, value)?;
                Ok(base.clone())
            }
            (Pin::Ref, EnvironmentDescriptors::Terraform { main_tf }) => {
                update_terraform_ref(main_tf, value)?;
                Ok(main_tf.clone())
            }
            (pin, EnvironmentDescriptors::Kustomize { .. }) => Err(DescriptorError::WrongKind {
                pin: pin.label(),
                kind: "Kustomize",
            }),
            (pin, EnvironmentDescriptors::Terraform { .. }) => Err(DescriptorError::WrongKind {
                pin: pin.label(),
                kind: "Terraform",
            }),
        }
    }
}

/// `images[0].newTag` of an overlay descriptor
pub fn read_image_tag(overlay: &Path) -> Option<String> {
    read_first_entry_value(overlay, IMAGES_KEY, NEW_TAG_KEY)
}

/// `helmCharts[0].version` of a base descriptor
pub fn read_chart_version(base: &Path) -> Option<String> {
    read_first_entry_value(base, HELM_CHARTS_KEY, VERSION_KEY)
}

pub fn update_image_tag(overlay: &Path, tag: &str) -> Result<(), DescriptorError> {
    update_first_entry_value(overlay, IMAGES_KEY, NEW_TAG_KEY, tag)
}

pub fn update_chart_version(base: &Path, version: &str) -> Result<(), DescriptorError> {
    update_first_entry_value(base, HELM_CHARTS_KEY, VERSION_KEY, version)
}

/// `None` when the file is missing or unreadable, `"N/A"` when the first list
/// entry has no `value_key`
fn read_first_entry_value(path: &Path, list_key: &str, value_key: &str) -> Option<String> {
    if !path.exists() {
        return None;
    }

    let document = match load_yaml(path) {
        Ok(document) => document,
        Err(e) => {
            warn!("Skipping unreadable descriptor: {}", e);
            return None;
        }
    };

    let first = document
        .get(list_key)
        .and_then(Value::as_sequence)
        .and_then(|entries| entries.first())?;

    Some(
        first
            .get(value_key)
            .and_then(scalar_to_string)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    )
}

fn update_first_entry_value(
    path: &Path,
    list_key: &'static str,
    value_key: &str,
    value: &str,
) -> Result<(), DescriptorError> {
    if !path.exists() {
        return Err(DescriptorError::NotFound(path.to_path_buf()));
    }

    let mut document = load_yaml(path)?;

    let first = document
        .get_mut(list_key)
        .and_then(Value::as_sequence_mut)
        .and_then(|entries| entries.first_mut())
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| DescriptorError::MissingKey {
            path: path.to_path_buf(),
            key: list_key,
        })?;

    set_key(first, value_key, value);

    let rendered = serde_yaml::to_string(&document).map_err(|source| DescriptorError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    write(path, &rendered)?;

    debug!("Set {}.{} = {} in {}", list_key, value_key, value, path.display());
    Ok(())
}

fn set_key(entry: &mut Mapping, key: &str, value: &str) {
    entry.insert(
        Value::String(key.to_string()),
        Value::String(value.to_string()),
    );
}

fn load_yaml(path: &Path) -> Result<Value, DescriptorError> {
    let content = fs::read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| DescriptorError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn write(path: &Path, content: &str) -> Result<(), DescriptorError> {
    fs::write(path, content).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Tag referenced by the first tagged module source in `main_tf`.
///
/// `None` when the file is missing, `"Not Found"` when no source carries a tag.
pub fn read_terraform_ref(main_tf: &Path) -> Option<String> {
    if !main_tf.exists() {
        return None;
    }

    let content = match fs::read_to_string(main_tf) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", main_tf.display(), e);
            return None;
        }
    };

    Some(
        TERRAFORM_SOURCE_REF
            .captures(&content)
            .and_then(|caps| caps.get(2))
            .map_or_else(|| TERRAFORM_REF_NOT_FOUND.to_string(), |m| m.as_str().to_string()),
    )
}

/// Point every tagged module source in `main_tf` at `version`
pub fn update_terraform_ref(main_tf: &Path, version: &str) -> Result<(), DescriptorError> {
    if !main_tf.exists() {
        return Err(DescriptorError::NotFound(main_tf.to_path_buf()));
    }

    let content = fs::read_to_string(main_tf).map_err(|source| DescriptorError::Io {
        path: main_tf.to_path_buf(),
        source,
    })?;

    if !TERRAFORM_SOURCE_REF.is_match(&content) {
        return Err(DescriptorError::PatternNotFound(main_tf.to_path_buf()));
    }

    let mut updated = TERRAFORM_SOURCE_REF
        .replace_all(&content, |caps: &regex::Captures<'_>| {
            format!("{}{}{}", &caps[1], version, &caps[3])
        })
        .into_owned();

    if !updated.ends_with('\n') {
        updated.push('\n');
    }

    write(main_tf, &updated)?;
    debug!("Set terraform ref = {} in {}", version, main_tf.display());
    Ok(())
}
