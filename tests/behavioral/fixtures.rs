// ABOUTME: Shared test fixtures and utilities for behavioral tests
//
// Provides:
// - git(): run git and fail on non-zero exit
// - Upstream: bare repository acting as the remote
// - TestRepo: clone of an Upstream with a tracking branch
// - ConfigRoot: temporary root folder holding config repositories
// - FakeGit: shell script standing in for the git binary

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run `git args...` in `dir`, returning stdout
pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git").args(args).current_dir(dir).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8(output.stdout)?)
}

fn configure_user(path: &Path) -> Result<()> {
    git(path, &["config", "user.email", "test@test.com"])?;
    git(path, &["config", "user.name", "Test User"])?;
    git(path, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

/// Bare repository seeded with one commit on `main`
pub struct Upstream {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl Upstream {
    pub fn new() -> Result<Self> {
        Self::with_files(&[("README.md", "# Test Repo\n")])
    }

    /// Bare repository whose first commit holds `files` (relative path, content)
    pub fn with_files(files: &[(&str, &str)]) -> Result<Self> {
        let dir = TempDir::new()?;
        let path = dir.path().join("upstream.git");
        std::fs::create_dir_all(&path)?;
        git(&path, &["init", "--bare", "--initial-branch=main"])?;

        let seed = TempDir::new()?;
        git(seed.path(), &["init", "--initial-branch=main"])?;
        configure_user(seed.path())?;
        for (relative, content) in files {
            let file = seed.path().join(relative);
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(file, content)?;
        }
        git(seed.path(), &["add", "-A"])?;
        git(seed.path(), &["commit", "-m", "Initial commit"])?;
        git(
            seed.path(),
            &["remote", "add", "origin", path.to_str().unwrap_or_default()],
        )?;
        git(seed.path(), &["push", "-u", "origin", "main"])?;

        Ok(Self { dir, path })
    }

    pub fn url(&self) -> String {
        self.path.display().to_string()
    }

    /// Push a new commit to the upstream from a throwaway clone
    pub fn push_commit(&self, filename: &str, content: &str, message: &str) -> Result<()> {
        let scratch = TempDir::new()?;
        let clone = scratch.path().join("clone");
        git(scratch.path(), &["clone", &self.url(), "clone"])?;
        configure_user(&clone)?;
        std::fs::write(clone.join(filename), content)?;
        git(&clone, &["add", filename])?;
        git(&clone, &["commit", "-m", message])?;
        git(&clone, &["push"])?;
        Ok(())
    }

    /// Subject line of the upstream's newest commit
    pub fn head_subject(&self) -> Result<String> {
        Ok(git(&self.path, &["log", "-1", "--format=%s"])?.trim().to_string())
    }
}

/// Working clone of an upstream with `main` tracking `origin/main`
pub struct TestRepo {
    pub path: PathBuf,
}

impl TestRepo {
    /// Clone `upstream` into `parent/name`
    pub fn clone_into(upstream: &Upstream, parent: &Path, name: &str) -> Result<Self> {
        git(parent, &["clone", &upstream.url(), name])?;
        let path = parent.join(name);
        configure_user(&path)?;
        Ok(Self { path })
    }

    /// Plain repository without any remote
    pub fn init_local(parent: &Path, name: &str) -> Result<Self> {
        let path = parent.join(name);
        std::fs::create_dir_all(&path)?;
        git(&path, &["init", "--initial-branch=main"])?;
        configure_user(&path)?;
        std::fs::write(path.join("README.md"), "# Local\n")?;
        git(&path, &["add", "-A"])?;
        git(&path, &["commit", "-m", "Initial commit"])?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        let file = self.path.join(relative);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(file, content)?;
        Ok(())
    }

    /// Write a file and commit it locally without pushing
    pub fn add_commit(&self, relative: &str, content: &str, message: &str) -> Result<()> {
        self.write(relative, content)?;
        git(&self.path, &["add", relative])?;
        git(&self.path, &["commit", "-m", message])?;
        Ok(())
    }

    pub fn porcelain_status(&self) -> Result<String> {
        git(&self.path, &["status", "--porcelain"])
    }
}

/// Temporary configuration root holding repository folders
///
/// The path is canonical so it matches the paths sessions and reports use.
pub struct ConfigRoot {
    pub dir: TempDir,
    path: PathBuf,
}

impl ConfigRoot {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let path = std::fs::canonicalize(dir.path())?;
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Executable shell script used in place of `git`
#[cfg(unix)]
pub struct FakeGit {
    pub dir: TempDir,
    pub program: PathBuf,
}

#[cfg(unix)]
impl FakeGit {
    /// `body` runs under `/bin/sh` with the git arguments as `$@`
    pub fn new(body: &str) -> Result<Self> {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new()?;
        let program = dir.path().join("fake-git");
        std::fs::write(&program, format!("#!/bin/sh\n{body}\n"))?;
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755))?;
        Ok(Self { dir, program })
    }

    pub fn executor(&self) -> pinmatrix::git::GitExecutor {
        pinmatrix::git::GitExecutor::with_program(self.program.as_os_str())
    }
}

/// Overlay descriptor pinning `tag` for one image
pub fn overlay_yaml(tag: &str) -> String {
    format!(
        "apiVersion: kustomize.config.k8s.io/v1beta1\nkind: Kustomization\nimages:\n- name: registry.example.com/alpha\n  newTag: {tag}\n"
    )
}

/// Base descriptor pinning chart `version`
pub fn base_yaml(version: &str) -> String {
    format!(
        "apiVersion: kustomize.config.k8s.io/v1beta1\nkind: Kustomization\nhelmCharts:\n- name: alpha\n  repo: https://charts.example.com\n  version: {version}\n"
    )
}

/// Terraform root module referencing module tag `tag`
pub fn main_tf(tag: &str) -> String {
    format!(
        "module \"alpha\" {{\n  source = \"git::https://git.example.com/modules/alpha.git?ref=tags/{tag}\"\n}}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_tracks_upstream() -> Result<()> {
        let upstream = Upstream::new()?;
        let root = ConfigRoot::new()?;
        let repo = TestRepo::clone_into(&upstream, root.path(), "alpha-kustomization")?;

        let tracking = git(repo.path(), &["rev-parse", "--abbrev-ref", "@{upstream}"])?;
        assert_eq!(tracking.trim(), "origin/main");
        assert!(repo.porcelain_status()?.is_empty());
        Ok(())
    }
}
