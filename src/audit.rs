// ABOUTME: Audit logging for user-initiated mutations
//
// Every commit/push, hard reset, file save, descriptor update, clone and
// settings change is appended to ~/.pinmatrix/logs/audit.jsonl, one JSON
// object per line, and mirrored to tracing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::git::OperationResult;

/// Types of auditable actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Git operations
    CommitPushed,
    HardReset,
    RepositoryCloned,

    // File operations
    FileSaved,
    DescriptorUpdated,

    // Settings
    SettingsSaved,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::CommitPushed => write!(f, "COMMIT_PUSHED"),
            AuditAction::HardReset => write!(f, "HARD_RESET"),
            AuditAction::RepositoryCloned => write!(f, "REPOSITORY_CLONED"),
            AuditAction::FileSaved => write!(f, "FILE_SAVED"),
            AuditAction::DescriptorUpdated => write!(f, "DESCRIPTOR_UPDATED"),
            AuditAction::SettingsSaved => write!(f, "SETTINGS_SAVED"),
        }
    }
}

/// Result of an audited action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Failed(String),
}

impl From<&OperationResult> for AuditResult {
    fn from(result: &OperationResult) -> Self {
        if result.ok {
            AuditResult::Success
        } else {
            AuditResult::Failed(result.message.clone())
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    pub action: AuditAction,

    pub result: AuditResult,

    /// Sync session the action was taken from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,

    /// Repository or file involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    pub trigger: AuditTrigger,
}

impl AuditEntry {
    pub fn new(action: AuditAction, result: AuditResult, trigger: AuditTrigger) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            result,
            session_id: None,
            path: None,
            details: None,
            trigger,
        }
    }

    pub fn with_session(mut self, session_id: Option<Uuid>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.display().to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// What triggered the audit action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditTrigger {
    /// CLI subcommand
    Command(String),
    /// Editor session finished
    Editor,
}

impl std::fmt::Display for AuditTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditTrigger::Command(cmd) => write!(f, "command:{}", cmd),
            AuditTrigger::Editor => write!(f, "editor"),
        }
    }
}

/// Opened on first use
static AUDIT_LOGGER: Mutex<Option<AuditLogger>> = Mutex::new(None);

/// Appends entries to a JSONL file
struct AuditLogger {
    writer: BufWriter<File>,
}

impl AuditLogger {
    fn open(log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(log_path)?;
        info!("Audit logging initialized: {:?}", log_path);
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    fn write_entry(&mut self, entry: &AuditEntry) -> std::io::Result<()> {
        let json = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }
}

/// Default audit log location
fn audit_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pinmatrix")
        .join("logs")
        .join("audit.jsonl")
}

/// Record an entry in tracing and in the audit file
pub fn audit_log(entry: AuditEntry) {
    info!(
        target: "audit",
        action = %entry.action,
        result = ?entry.result,
        trigger = %entry.trigger,
        session_id = ?entry.session_id,
        path = ?entry.path,
        "AUDIT: {}",
        entry.action
    );

    let mut global = match AUDIT_LOGGER.lock() {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to acquire audit logger lock: {}", e);
            return;
        }
    };

    if global.is_none() {
        match AuditLogger::open(&audit_log_path()) {
            Ok(logger) => *global = Some(logger),
            Err(e) => {
                error!("Failed to initialize audit logger: {}", e);
                return;
            }
        }
    }

    if let Some(logger) = global.as_mut() {
        if let Err(e) = logger.write_entry(&entry) {
            error!("Failed to write audit entry: {}", e);
        }
    }
}

// ============================================================================
// Convenience functions for common audit scenarios
// ============================================================================

pub fn audit_commit_pushed(
    session_id: Option<Uuid>,
    repo_path: &Path,
    message: &str,
    result: &OperationResult,
) {
    audit_log(
        AuditEntry::new(
            AuditAction::CommitPushed,
            AuditResult::from(result),
            AuditTrigger::Command("commit".to_string()),
        )
        .with_session(session_id)
        .with_path(repo_path)
        .with_details(format!("message: {}", message)),
    );
}

pub fn audit_hard_reset(session_id: Option<Uuid>, repo_path: &Path, result: &OperationResult) {
    audit_log(
        AuditEntry::new(
            AuditAction::HardReset,
            AuditResult::from(result),
            AuditTrigger::Command("reset".to_string()),
        )
        .with_session(session_id)
        .with_path(repo_path),
    );
}

pub fn audit_file_saved(file_path: &Path, trigger: AuditTrigger, result: AuditResult) {
    audit_log(AuditEntry::new(AuditAction::FileSaved, result, trigger).with_path(file_path));
}

pub fn audit_descriptor_updated(file_path: &Path, details: String, result: AuditResult) {
    audit_log(
        AuditEntry::new(
            AuditAction::DescriptorUpdated,
            result,
            AuditTrigger::Command("set".to_string()),
        )
        .with_path(file_path)
        .with_details(details),
    );
}

pub fn audit_repository_cloned(target: &Path, url: &str, result: AuditResult) {
    audit_log(
        AuditEntry::new(
            AuditAction::RepositoryCloned,
            result,
            AuditTrigger::Command("clone".to_string()),
        )
        .with_path(target)
        .with_details(format!("url: {}", url)),
    );
}

pub fn audit_settings_saved(settings_path: &Path, trigger: AuditTrigger, result: AuditResult) {
    audit_log(
        AuditEntry::new(AuditAction::SettingsSaved, result, trigger).with_path(settings_path),
    );
}
