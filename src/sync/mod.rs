// ABOUTME: Reconciliation of repository sync status into a frozen per-pass session

pub mod engine;
pub mod session;

pub use engine::SyncEngine;
pub use session::SyncSession;
