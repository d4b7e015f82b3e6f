// ABOUTME: CLI argument parsing and command routing for pinmatrix
//
// Provides command-line interface for:
// - Viewing the version matrix and repository sync status (matrix, status)
// - Syncing checkouts (pull, clone)
// - Changing pins (set, edit, values)
// - Publishing or discarding local work (diff, commit, reset)

pub mod clone;
pub mod context;
pub mod edit;
pub mod matrix;
pub mod pull;
pub mod repo;
pub mod status;
pub mod util;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::matrix::Pin;
use crate::models::DeploymentKind;
use context::AppContext;

/// Version pins across deployment configuration repositories
#[derive(Parser)]
#[command(name = "pinmatrix")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the configuration repositories
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Skip pulling repositories before reading them
    #[arg(long, global = true)]
    pub no_pull: bool,
}

/// Output format for commands
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Deployment kind filter
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Kustomize,
    Terraform,
}

impl From<KindArg> for DeploymentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Kustomize => DeploymentKind::Kustomize,
            KindArg::Terraform => DeploymentKind::Terraform,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the project x environment version matrix (default)
    Matrix(MatrixArgs),

    /// Show per-repository sync status
    Status(StatusArgs),

    /// Pull every repository under the root
    Pull,

    /// Show uncommitted changes of a repository
    Diff(RepoArgs),

    /// Commit all changes of a repository and push them
    Commit(CommitArgs),

    /// Discard all local work and reset a repository to its upstream
    Reset(ResetArgs),

    /// Change one version pin of a project environment
    Set(SetArgs),

    /// Edit the descriptor of a project environment
    Edit(EditArgs),

    /// Show or edit the Helm chart values of a project
    Values(ValuesArgs),

    /// Clone repositories listed in the project list that are missing locally
    Clone(CloneArgs),
}

/// Arguments for the matrix command
#[derive(clap::Args, Default)]
pub struct MatrixArgs {
    /// Only show one deployment kind (remembered for later runs)
    #[arg(long)]
    pub kind: Option<KindArg>,

    /// Ignore the remembered deployment kind filter
    #[arg(long, conflicts_with = "kind")]
    pub all: bool,

    /// Only show projects whose name contains this text
    #[arg(long)]
    pub project: Option<String>,
}

/// Arguments for the status command
#[derive(clap::Args)]
pub struct StatusArgs {
    /// Only list repositories with uncommitted or unpushed work
    #[arg(long)]
    pub changed: bool,
}

/// A repository folder under the root
#[derive(clap::Args)]
pub struct RepoArgs {
    /// Repository folder name
    pub repo: String,
}

/// Arguments for the commit command
#[derive(clap::Args)]
pub struct CommitArgs {
    /// Repository folder name
    pub repo: String,

    /// Commit message
    #[arg(long, short)]
    pub message: String,
}

/// Arguments for the reset command
#[derive(clap::Args)]
pub struct ResetArgs {
    /// Repository folder name
    pub repo: String,

    /// Reset without confirmation
    #[arg(long, short)]
    pub force: bool,
}

/// Arguments for the set command
#[derive(clap::Args)]
pub struct SetArgs {
    pub project: String,

    pub environment: String,

    /// Which pin to change
    #[arg(value_enum)]
    pub pin: Pin,

    /// New value
    pub value: String,

    /// Repository folder, when several repositories serve the environment
    #[arg(long)]
    pub repo: Option<String>,
}

/// Arguments for the edit command
#[derive(clap::Args)]
pub struct EditArgs {
    pub project: String,

    pub environment: String,

    /// Repository folder, when several repositories serve the environment
    #[arg(long)]
    pub repo: Option<String>,

    /// Edit the base descriptor instead of the overlay (Kustomize)
    #[arg(long)]
    pub base: bool,
}

/// Arguments for the values command
#[derive(clap::Args)]
pub struct ValuesArgs {
    pub project: String,

    /// Open the values file in an editor
    #[arg(long, short)]
    pub edit: bool,
}

/// Arguments for the clone command
#[derive(clap::Args)]
pub struct CloneArgs {
    /// Project list to read instead of the configured one
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::load(cli.root.clone())?;
    let pull = ctx.should_pull(cli.no_pull);
    let format = cli.format;

    match cli.command.unwrap_or(Commands::Matrix(MatrixArgs::default())) {
        Commands::Matrix(args) => matrix::execute(&ctx, args, pull, format).await,
        Commands::Status(args) => status::execute(&ctx, args, pull, format).await,
        Commands::Pull => pull::execute(&ctx, format).await,
        Commands::Diff(args) => repo::diff(&ctx, args).await,
        Commands::Commit(args) => repo::commit(&ctx, args, format).await,
        Commands::Reset(args) => repo::reset(&ctx, args, format).await,
        Commands::Set(args) => edit::set(&ctx, args, format).await,
        Commands::Edit(args) => edit::edit(&ctx, args).await,
        Commands::Values(args) => edit::values(&ctx, args).await,
        Commands::Clone(args) => clone::execute(&ctx, args, format).await,
    }
}
