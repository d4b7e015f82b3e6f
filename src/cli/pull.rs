// ABOUTME: CLI pull command - pull every repository under the root and report outcomes

use anyhow::Result;

use super::context::AppContext;
use super::util::{pad, print_json};
use super::OutputFormat;
use crate::git::PullOutcome;

/// Execute the pull command
pub async fn execute(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let report = ctx.engine.pull_all(&ctx.root).await;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            if report.is_empty() {
                println!("No repositories found under {}.", ctx.root.display());
                return Ok(());
            }

            for outcome in report.sorted() {
                println!("{} {}", pad(&folder_name(outcome), 36), outcome_text(outcome));
            }
            println!();
            println!(
                "{}/{} repositories pulled in {:.1}s",
                report.succeeded_count(),
                report.len(),
                report.elapsed.as_secs_f64()
            );
        }
    }

    Ok(())
}

fn folder_name(outcome: &PullOutcome) -> String {
    outcome
        .repo_path
        .file_name()
        .map_or_else(
            || outcome.repo_path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
}

fn outcome_text(outcome: &PullOutcome) -> String {
    if !outcome.succeeded {
        format!("failed: {}", outcome.message)
    } else if outcome.updated {
        "updated".to_string()
    } else {
        "up to date".to_string()
    }
}
