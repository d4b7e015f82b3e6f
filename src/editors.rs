//! Editor detection for the `edit` and `values` commands.
//!
//! `$VISUAL` and `$EDITOR` win; otherwise the first installed editor from
//! [`EDITORS`] is used. GUI editors get the flag that makes them block until
//! the file is closed.

use std::path::Path;
use std::process::ExitStatus;

/// Supported editors: display name, executable, arguments that make it wait.
pub const EDITORS: &[(&str, &str, &[&str])] = &[
    ("VS Code", "code", &["--wait"]),
    ("Cursor", "cursor", &["--wait"]),
    ("Zed", "zed", &["--wait"]),
    ("Neovim", "nvim", &[]),
    ("Vim", "vim", &[]),
    ("Emacs", "emacs", &[]),
    ("Sublime Text", "subl", &["--wait"]),
    ("Nano", "nano", &[]),
];

/// A resolved editor invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EditorCommand {
    /// Parse an `$EDITOR`-style value such as `code --wait`
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split_whitespace();
        let program = parts.next()?.to_string();
        let mut args: Vec<String> = parts.map(str::to_string).collect();

        // `EDITOR=code` returns immediately without --wait
        if args.is_empty() {
            args = wait_args(&program);
        }

        Some(Self { program, args })
    }

    /// Open `path` and block until the editor exits
    pub async fn open_and_wait(&self, path: &Path) -> std::io::Result<ExitStatus> {
        tracing::debug!("Launching {} {:?} {}", self.program, self.args, path.display());
        tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .await
    }
}

fn wait_args(program: &str) -> Vec<String> {
    let name = Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program);

    EDITORS
        .iter()
        .find(|(_, cmd, _)| *cmd == name)
        .map(|(_, _, args)| args.iter().map(|a| (*a).to_string()).collect())
        .unwrap_or_default()
}

/// Check if a command exists on the system (cross-platform).
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Convert command to editor display name.
#[must_use]
pub fn editor_command_to_name(command: &str) -> Option<&'static str> {
    EDITORS
        .iter()
        .find(|(_, cmd, _)| *cmd == command)
        .map(|(name, _, _)| *name)
}

/// Get only the editors that are installed on the system.
/// Returns a list of (display_name, command) tuples.
#[must_use]
pub fn get_installed_editors() -> Vec<(String, String)> {
    EDITORS
        .iter()
        .filter(|(_, cmd, _)| command_exists(cmd))
        .map(|(name, cmd, _)| ((*name).to_string(), (*cmd).to_string()))
        .collect()
}

/// Editor to launch: `$VISUAL`, then `$EDITOR`, then the first installed one
#[must_use]
pub fn resolve_editor() -> Option<EditorCommand> {
    resolve_editor_from(
        std::env::var("VISUAL").ok().as_deref(),
        std::env::var("EDITOR").ok().as_deref(),
    )
}

fn resolve_editor_from(visual: Option<&str>, editor: Option<&str>) -> Option<EditorCommand> {
    visual
        .into_iter()
        .chain(editor)
        .find_map(EditorCommand::parse)
        .or_else(|| {
            get_installed_editors()
                .into_iter()
                .next()
                .and_then(|(_, cmd)| EditorCommand::parse(&cmd))
        })
}
