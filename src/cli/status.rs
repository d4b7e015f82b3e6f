// ABOUTME: CLI status command - per-repository sync status of the current pass
//
// Shows which checkouts carry uncommitted changes or unpushed commits, which
// track no upstream, and which failed to pull.

use anyhow::Result;
use serde::Serialize;

use super::context::AppContext;
use super::matrix::print_pull_failures;
use super::util::{pad, print_json};
use super::{OutputFormat, StatusArgs};
use crate::git::{SyncStatus, UpstreamState};
use crate::models::RepositoryKind;
use crate::sync::SyncSession;

const NAME_COLUMN_WIDTH: usize = 36;

/// JSON output structure for one repository
#[derive(Debug, Serialize)]
pub struct RepositoryStatusOutput {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub is_dirty: bool,
    pub is_ahead: bool,
    pub has_changes: bool,
    pub upstream: UpstreamState,
    pub pull_failed: bool,
}

/// Execute the status command
pub async fn execute(ctx: &AppContext, args: StatusArgs, pull: bool, format: OutputFormat) -> Result<()> {
    let session = ctx.session(pull).await;
    let statuses = collect(ctx, &session, args.changed);

    match format {
        OutputFormat::Json => print_json(&statuses)?,
        OutputFormat::Text => {
            output_text(&statuses);
            print_pull_failures(session.pull_report());
        }
    }

    Ok(())
}

fn collect(ctx: &AppContext, session: &SyncSession, changed_only: bool) -> Vec<RepositoryStatusOutput> {
    session
        .repositories()
        .iter()
        .filter(|handle| !changed_only || session.has_changes(&handle.path))
        .map(|handle| {
            let status = session.status(&handle.path);
            RepositoryStatusOutput {
                name: handle.name().to_string(),
                path: handle.path.display().to_string(),
                project: RepositoryKind::classify(
                    handle.name(),
                    &ctx.config.layout,
                    ctx.virtual_projects(),
                )
                .map(|kind| kind.project().to_string()),
                is_dirty: status.is_dirty,
                is_ahead: status.is_ahead,
                has_changes: status.has_changes(),
                upstream: status.upstream,
                pull_failed: session.pull_failed(&handle.path),
            }
        })
        .collect()
}

fn output_text(statuses: &[RepositoryStatusOutput]) {
    if statuses.is_empty() {
        println!("No repositories found.");
        return;
    }

    println!("{} STATUS", pad("REPOSITORY", NAME_COLUMN_WIDTH));
    println!("{}", "-".repeat(NAME_COLUMN_WIDTH + 30));

    for repo in statuses {
        println!(
            "{} {}",
            pad(&repo.name, NAME_COLUMN_WIDTH),
            describe(&SyncStatus {
                is_dirty: repo.is_dirty,
                is_ahead: repo.is_ahead,
                upstream: repo.upstream,
            })
        );
    }
}

/// Short human description of a status
fn describe(status: &SyncStatus) -> String {
    let mut parts = Vec::new();
    if status.is_dirty {
        parts.push("uncommitted changes");
    }
    if status.is_ahead {
        parts.push("unpushed commits");
    }
    if status.upstream == UpstreamState::Missing {
        parts.push("no upstream");
    }

    if parts.is_empty() {
        "clean".to_string()
    } else {
        parts.join(", ")
    }
}
