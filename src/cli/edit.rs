// ABOUTME: CLI set, edit and values commands - change version pins and descriptor files
//
// Edits go through a temporary copy so invalid YAML never reaches the repository.

use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;
use std::path::Path;

use super::context::AppContext;
use super::util::print_json;
use super::{EditArgs, OutputFormat, SetArgs, ValuesArgs};
use crate::audit::{self, AuditResult, AuditTrigger};
use crate::config::settings::SettingsUpdate;
use crate::editors::resolve_editor;
use crate::matrix::{
    chart_values, load_rows, read_file_content, save_file_content, Pin, ProjectEnvironmentRow,
    SaveOutcome,
};
use crate::models::{DeploymentKind, EnvironmentDescriptors, RepositoryKind};

/// Execute the set command
pub async fn set(ctx: &AppContext, args: SetArgs, format: OutputFormat) -> Result<()> {
    let rows = environment_rows(ctx).await;
    let row = select_row(
        &rows,
        &args.project,
        &args.environment,
        args.repo.as_deref(),
        Some(pin_kind(args.pin)),
    )?;

    let descriptors = descriptors_of(row);
    let details = format!(
        "{}/{} {} = {}",
        row.project,
        row.environment,
        args.pin.label(),
        args.value
    );

    let path = match args.pin.apply(&descriptors, &args.value) {
        Ok(path) => {
            audit::audit_descriptor_updated(&path, details, AuditResult::Success);
            path
        }
        Err(e) => {
            audit::audit_descriptor_updated(
                descriptors.primary(),
                details,
                AuditResult::Failed(e.to_string()),
            );
            return Err(e.into());
        }
    };

    remember_selection(ctx, row, "set");

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "project": row.project,
            "environment": row.environment,
            "pin": args.pin.label(),
            "value": args.value,
            "file": path.display().to_string(),
            "repository": row.repo_folder,
        }))?,
        OutputFormat::Text => {
            println!(
                "Set {} of {}/{} to {} in {}",
                args.pin.label(),
                row.project,
                row.environment,
                args.value,
                path.display()
            );
            println!(
                "Publish with: pinmatrix commit {} -m \"...\"",
                row.repo_folder
            );
        }
    }

    Ok(())
}

/// Execute the edit command
pub async fn edit(ctx: &AppContext, args: EditArgs) -> Result<()> {
    let rows = environment_rows(ctx).await;
    let kind_hint = args.base.then_some(DeploymentKind::Kustomize);
    let row = select_row(
        &rows,
        &args.project,
        &args.environment,
        args.repo.as_deref(),
        kind_hint,
    )?;

    let target = match descriptors_of(row) {
        EnvironmentDescriptors::Kustomize { base, .. } if args.base => base,
        descriptors => descriptors.primary().to_path_buf(),
    };

    remember_selection(ctx, row, "edit");
    edit_file(&target).await?;
    Ok(())
}

/// Execute the values command
pub async fn values(ctx: &AppContext, args: ValuesArgs) -> Result<()> {
    let values = chart_values(&ctx.root, &args.project, &ctx.config.layout.chart_suffix)?;

    if args.edit {
        edit_file(&values.path).await?;
    } else {
        println!("# {}", values.path.display());
        print!("{}", values.content);
    }

    Ok(())
}

/// Open a temporary copy of `path` in the user's editor and save it back if it changed
async fn edit_file(path: &Path) -> Result<SaveOutcome> {
    let editor = resolve_editor()
        .ok_or_else(|| anyhow!("No editor found. Set $EDITOR or install one of: code, nvim, vim"))?;

    let original = read_file_content(path);
    let suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let mut scratch = tempfile::Builder::new()
        .prefix("pinmatrix-")
        .suffix(&suffix)
        .tempfile()
        .context("Failed to create temporary file")?;
    scratch
        .write_all(original.as_bytes())
        .context("Failed to write temporary file")?;
    scratch.flush()?;

    let status = editor
        .open_and_wait(scratch.path())
        .await
        .with_context(|| format!("Failed to launch editor '{}'", editor.program))?;
    if !status.success() {
        bail!("Editor '{}' exited with {}", editor.program, status);
    }

    let edited = std::fs::read_to_string(scratch.path()).context("Failed to read edited file")?;

    match save_file_content(path, &edited) {
        Ok(SaveOutcome::Unchanged) => {
            println!("No changes to {}.", path.display());
            Ok(SaveOutcome::Unchanged)
        }
        Ok(SaveOutcome::Saved) => {
            audit::audit_file_saved(path, AuditTrigger::Editor, AuditResult::Success);
            println!("Saved {}.", path.display());
            Ok(SaveOutcome::Saved)
        }
        Err(e) => {
            audit::audit_file_saved(path, AuditTrigger::Editor, AuditResult::Failed(e.to_string()));
            Err(e.into())
        }
    }
}

async fn environment_rows(ctx: &AppContext) -> Vec<ProjectEnvironmentRow> {
    let session = ctx.session(false).await;
    load_rows(&session, &ctx.config.layout, ctx.virtual_projects())
}

fn pin_kind(pin: Pin) -> DeploymentKind {
    match pin {
        Pin::Image | Pin::Chart => DeploymentKind::Kustomize,
        Pin::Ref => DeploymentKind::Terraform,
    }
}

fn descriptors_of(row: &ProjectEnvironmentRow) -> EnvironmentDescriptors {
    RepositoryKind::from_parts(row.kind, row.project.clone())
        .descriptors(&row.repo_path, &row.environment)
}

fn remember_selection(ctx: &AppContext, row: &ProjectEnvironmentRow, command: &str) {
    ctx.remember(
        SettingsUpdate {
            last_proj: Some(row.project.clone()),
            last_env: Some(row.environment.clone()),
            ..Default::default()
        },
        command,
    );
}

/// Pick the single row for a project environment, narrowed by repository folder and kind
fn select_row<'a>(
    rows: &'a [ProjectEnvironmentRow],
    project: &str,
    environment: &str,
    repo: Option<&str>,
    kind: Option<DeploymentKind>,
) -> Result<&'a ProjectEnvironmentRow> {
    let candidates: Vec<&ProjectEnvironmentRow> = rows
        .iter()
        .filter(|r| r.project == project && r.environment == environment)
        .collect();

    if candidates.is_empty() {
        let environments: Vec<&str> = rows
            .iter()
            .filter(|r| r.project == project)
            .map(|r| r.environment.as_str())
            .collect();
        if environments.is_empty() {
            bail!("Project '{}' not found.", project);
        }
        bail!(
            "Environment '{}' not found for project '{}'. Available: {}",
            environment,
            project,
            environments.join(", ")
        );
    }

    let narrowed: Vec<&ProjectEnvironmentRow> = candidates
        .into_iter()
        .filter(|r| repo.map_or(true, |folder| r.repo_folder == folder))
        .filter(|r| kind.map_or(true, |k| r.kind == k))
        .collect();

    match narrowed.as_slice() {
        [row] => Ok(*row),
        [] => Err(anyhow!(
            "No matching repository for {}/{}{}",
            project,
            environment,
            kind.map(|k| format!(" ({})", k.label())).unwrap_or_default()
        )),
        many => {
            let folders: Vec<&str> = many.iter().map(|r| r.repo_folder.as_str()).collect();
            Err(anyhow!(
                "{}/{} is served by several repositories ({}). Pick one with --repo.",
                project,
                environment,
                folders.join(", ")
            ))
        }
    }
}
