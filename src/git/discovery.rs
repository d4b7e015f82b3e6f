// ABOUTME: Repository discovery over a configuration root directory
// Lists immediate subfolders on every call; the set of checkouts changes between passes

use git2::Repository;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::models::RepositoryHandle;

/// Absolute form of `root` when it exists, the path unchanged otherwise
pub fn normalize_root(root: &Path) -> PathBuf {
    fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}

/// Immediate subdirectories of `root`, sorted by name. Missing root yields nothing.
pub fn list_subdirectories(root: &Path) -> Vec<PathBuf> {
    let root = normalize_root(root);

    let entries = match fs::read_dir(&root) {
        Ok(entries) => entries,
        Err(e) => {
            if root.exists() {
                warn!("Failed to read root directory {}: {}", root.display(), e);
            } else {
                debug!("Root directory {} does not exist", root.display());
            }
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();

    dirs.sort();
    dirs
}

/// Scan `root` for repository candidates.
///
/// Every immediate subfolder becomes a handle whether or not it is a valid
/// checkout; probing and pulling decide validity later.
pub fn discover(root: &Path) -> Vec<RepositoryHandle> {
    let handles: Vec<RepositoryHandle> = list_subdirectories(root)
        .into_iter()
        .map(RepositoryHandle::new)
        .collect();

    info!(
        "Discovered {} repository candidates under {}",
        handles.len(),
        root.display()
    );
    handles
}

/// Whether `path` is the root of a non-bare git checkout
pub fn is_repository_root(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }

    match Repository::open(path) {
        Ok(repo) => !repo.is_bare(),
        Err(_) => false,
    }
}
