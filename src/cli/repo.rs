// ABOUTME: CLI diff, commit and reset commands for a single repository
//
// diff: show uncommitted changes
// commit: stage everything, commit and push
// reset: discard local work and return to the upstream tip, with confirmation prompt

use anyhow::{bail, Result};

use super::context::AppContext;
use super::util::{confirm, find_repository, print_json};
use super::{CommitArgs, OutputFormat, RepoArgs, ResetArgs};
use crate::git::OperationResult;

/// Execute the diff command
pub async fn diff(ctx: &AppContext, args: RepoArgs) -> Result<()> {
    let session = ctx.session(false).await;
    let repo = find_repository(&session, &args.repo)?;

    match ctx.engine.diff(&repo.path).await {
        Some(diff) => print!("{diff}"),
        None => println!("No uncommitted changes in {}.", repo.name()),
    }

    Ok(())
}

/// Execute the commit command
pub async fn commit(ctx: &AppContext, args: CommitArgs, format: OutputFormat) -> Result<()> {
    let session = ctx.session(false).await;
    let repo = find_repository(&session, &args.repo)?;

    let result = ctx
        .engine
        .commit_and_push(Some(&session), &repo.path, &args.message)
        .await;

    report(repo.name(), &result, format)
}

/// Execute the reset command
pub async fn reset(ctx: &AppContext, args: ResetArgs, format: OutputFormat) -> Result<()> {
    let session = ctx.session(false).await;
    let repo = find_repository(&session, &args.repo)?;

    if !args.force {
        let status = session.status(&repo.path);
        if status.has_changes() {
            println!(
                "{} has uncommitted changes or unpushed commits that will be lost.",
                repo.name()
            );
        }
        if !confirm(&format!("Hard reset '{}' to its upstream?", repo.name()))? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let result = ctx.engine.hard_reset(Some(&session), &repo.path).await;
    report(repo.name(), &result, format)
}

fn report(name: &str, result: &OperationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(result)?,
        OutputFormat::Text => {
            if result.ok {
                println!("{name}: {}", result.message);
            }
        }
    }

    if !result.ok {
        bail!("{name}: {}", result.message);
    }
    Ok(())
}
