// ABOUTME: CLI clone command - bootstrap the root from the project list
//
// Clones missing repositories and records virtual-project directives in settings.

use anyhow::{Context, Result};
use serde::Serialize;

use super::context::AppContext;
use super::util::{pad, print_json};
use super::{CloneArgs, OutputFormat};
use crate::audit::{self, AuditResult, AuditTrigger};
use crate::config::Settings;
use crate::git::project_list::{clone_missing, CloneOutcome, CloneStatus, ProjectList};

#[derive(Serialize)]
struct CloneOutput {
    outcomes: Vec<CloneOutcome>,
    skipped_lines: Vec<String>,
    virtual_projects_added: usize,
}

/// Execute the clone command
pub async fn execute(ctx: &AppContext, args: CloneArgs, format: OutputFormat) -> Result<()> {
    let list_path = args
        .file
        .unwrap_or_else(|| ctx.config.projects_file_for(&ctx.root));
    let list = ProjectList::load(&list_path)?;

    let outcomes = clone_missing(ctx.engine.executor(), &ctx.root, &list.entries).await?;
    for outcome in &outcomes {
        let result = match outcome.status {
            CloneStatus::Cloned => AuditResult::Success,
            CloneStatus::AlreadyPresent => continue,
            CloneStatus::Failed => AuditResult::Failed(outcome.message.clone()),
        };
        audit::audit_repository_cloned(&ctx.root.join(&outcome.folder), &outcome.url, result);
    }

    let virtual_projects_added = record_virtual_projects(ctx, &list)?;

    let skipped_lines: Vec<String> = list.errors.iter().map(ToString::to_string).collect();

    match format {
        OutputFormat::Json => print_json(&CloneOutput {
            outcomes,
            skipped_lines,
            virtual_projects_added,
        })?,
        OutputFormat::Text => {
            println!("Project list: {}", list_path.display());
            for outcome in &outcomes {
                let status = match outcome.status {
                    CloneStatus::Cloned => "cloned".to_string(),
                    CloneStatus::AlreadyPresent => "present".to_string(),
                    CloneStatus::Failed => format!("failed: {}", outcome.message),
                };
                println!("  {} {}", pad(&outcome.folder, 36), status);
            }
            if virtual_projects_added > 0 {
                println!("Recorded {virtual_projects_added} virtual project mapping(s).");
            }
            for line in &skipped_lines {
                eprintln!("Skipped {line}");
            }
        }
    }

    Ok(())
}

fn record_virtual_projects(ctx: &AppContext, list: &ProjectList) -> Result<usize> {
    let mappings = list.virtual_projects();
    if mappings.is_empty() {
        return Ok(0);
    }

    let mut settings = Settings::load(&ctx.settings_path);
    let changed = settings.merge_virtual_projects(&mappings);
    if changed == 0 {
        return Ok(0);
    }

    let saved = settings
        .save(&ctx.settings_path)
        .context("Failed to record virtual projects");
    let result = match &saved {
        Ok(()) => AuditResult::Success,
        Err(e) => AuditResult::Failed(e.to_string()),
    };
    audit::audit_settings_saved(
        &ctx.settings_path,
        AuditTrigger::Command("clone".to_string()),
        result,
    );

    saved.map(|()| changed)
}
