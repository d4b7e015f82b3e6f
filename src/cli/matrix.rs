// ABOUTME: CLI matrix command - project x environment table of version pins
//
// Cells marked with '*' belong to a repository with uncommitted or unpushed work.

use anyhow::Result;
use serde::Serialize;

use super::context::AppContext;
use super::util::{pad, print_json, truncate};
use super::{MatrixArgs, OutputFormat};
use crate::config::settings::SettingsUpdate;
use crate::git::PullReport;
use crate::matrix::rows::filter_kind;
use crate::matrix::{load_rows, VersionMatrix};
use crate::models::DeploymentKind;

const CHANGED_MARKER: &str = "*";
const PROJECT_COLUMN_WIDTH: usize = 20;

#[derive(Serialize)]
struct MatrixOutput<'a> {
    session_id: String,
    root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<DeploymentKind>,
    matrix: &'a VersionMatrix,
    pull_failures: Vec<String>,
}

/// Execute the matrix command
pub async fn execute(ctx: &AppContext, args: MatrixArgs, pull: bool, format: OutputFormat) -> Result<()> {
    let kind: Option<DeploymentKind> = if args.all {
        None
    } else {
        args.kind.map(Into::into).or(ctx.settings.last_provider)
    };

    if let Some(chosen) = args.kind {
        ctx.remember(
            SettingsUpdate {
                last_provider: Some(chosen.into()),
                ..Default::default()
            },
            "matrix",
        );
    }

    let session = ctx.session(pull).await;
    let mut rows = filter_kind(
        load_rows(&session, &ctx.config.layout, ctx.virtual_projects()),
        kind,
    );
    if let Some(ref needle) = args.project {
        let needle = needle.to_lowercase();
        rows.retain(|row| row.project.to_lowercase().contains(&needle));
    }

    let matrix = VersionMatrix::build(rows, &ctx.config.display.environment_priority);

    match format {
        OutputFormat::Json => print_json(&MatrixOutput {
            session_id: session.id().to_string(),
            root: session.root().display().to_string(),
            kind,
            matrix: &matrix,
            pull_failures: failed_pulls(session.pull_report()),
        })?,
        OutputFormat::Text => {
            output_text(&matrix, ctx.config.display.truncate_width);
            print_pull_failures(session.pull_report());
        }
    }

    Ok(())
}

fn output_text(matrix: &VersionMatrix, width: usize) {
    if matrix.is_empty() {
        println!("No projects found.");
        return;
    }

    let lines: Vec<(String, Vec<String>)> = matrix
        .projects()
        .into_iter()
        .map(|project| {
            let cells = matrix
                .environments()
                .iter()
                .map(|env| cell_text(matrix, project, env, width))
                .collect();
            (project.to_string(), cells)
        })
        .collect();

    let column_widths: Vec<usize> = matrix
        .environments()
        .iter()
        .enumerate()
        .map(|(i, env)| {
            lines
                .iter()
                .map(|(_, cells)| cells[i].chars().count())
                .chain(std::iter::once(env.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut header = pad("PROJECT", PROJECT_COLUMN_WIDTH);
    for (env, w) in matrix.environments().iter().zip(&column_widths) {
        header.push_str("  ");
        header.push_str(&pad(&env.to_uppercase(), *w));
    }
    println!("{}", header.trim_end());
    println!("{}", "-".repeat(header.trim_end().chars().count()));

    for (project, cells) in &lines {
        let mut line = pad(&truncate(project, PROJECT_COLUMN_WIDTH), PROJECT_COLUMN_WIDTH);
        for (cell, w) in cells.iter().zip(&column_widths) {
            line.push_str("  ");
            line.push_str(&pad(cell, *w));
        }
        println!("{}", line.trim_end());
    }
}

fn cell_text(matrix: &VersionMatrix, project: &str, env: &str, width: usize) -> String {
    let Some(cell) = matrix.cell(project, env) else {
        return "-".to_string();
    };

    let summary = cell
        .rows
        .iter()
        .map(|row| row.summary(width))
        .collect::<Vec<_>>()
        .join(" | ");

    if cell.has_changes {
        format!("{summary} {CHANGED_MARKER}")
    } else {
        summary
    }
}

pub(super) fn failed_pulls(report: Option<&PullReport>) -> Vec<String> {
    report
        .map(|r| {
            r.failures()
                .into_iter()
                .map(|o| {
                    let name = o
                        .repo_path
                        .file_name()
                        .map_or_else(|| o.repo_path.display().to_string(), |n| n.to_string_lossy().into_owned());
                    format!("{name}: {}", o.message)
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(super) fn print_pull_failures(report: Option<&PullReport>) {
    let failures = failed_pulls(report);
    if failures.is_empty() {
        return;
    }

    eprintln!();
    eprintln!("Warning: {} repositories could not be pulled:", failures.len());
    for failure in failures {
        eprintln!("  {failure}");
    }
}
