// ABOUTME: Shared CLI utilities: repository lookup, confirmation prompts and text formatting

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::io::{self, Write};

use crate::models::RepositoryHandle;
use crate::sync::SyncSession;

/// Find a discovered repository by folder name
///
/// Matching priority:
/// 1. Exact folder name
/// 2. Unique folder name prefix (case-insensitive)
pub fn find_repository<'a>(session: &'a SyncSession, name: &str) -> Result<&'a RepositoryHandle> {
    find_repository_in(session.repositories(), name)
}

pub fn find_repository_in<'a>(
    repositories: &'a [RepositoryHandle],
    name: &str,
) -> Result<&'a RepositoryHandle> {
    if repositories.is_empty() {
        return Err(anyhow!("No repositories found under the root directory."));
    }

    if let Some(handle) = repositories.iter().find(|h| h.name() == name) {
        return Ok(handle);
    }

    let name_lower = name.to_lowercase();
    let matches: Vec<&RepositoryHandle> = repositories
        .iter()
        .filter(|h| h.name().to_lowercase().starts_with(&name_lower))
        .collect();

    match matches.len() {
        1 => Ok(matches[0]),
        0 => {
            let available: Vec<String> = repositories
                .iter()
                .map(|h| format!("  {}", h.name()))
                .collect();
            Err(anyhow!(
                "Repository '{}' not found. Available repositories:\n{}",
                name,
                available.join("\n")
            ))
        }
        _ => {
            let names: Vec<String> = matches.iter().map(|h| format!("  {}", h.name())).collect();
            Err(anyhow!(
                "Ambiguous repository '{}'. Matches:\n{}",
                name,
                names.join("\n")
            ))
        }
    }
}

/// Ask a yes/no question on stdin; anything but `y` is a no
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// Truncate a string to fit in the given width (character-aware for UTF-8)
pub fn truncate(s: &str, max_len: usize) -> String {
    if max_len <= 3 {
        return ".".repeat(max_len);
    }
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Left-align `s` in a column of `width` characters
pub fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}
