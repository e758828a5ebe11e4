/// State management module
///
/// This module holds the catalog core, including:
/// - The record store over SQLite (library.rs)
/// - Shared data structures (data.rs) and errors (error.rs)
/// - Snapshot diffing for the editable grid (reconcile.rs)
/// - Notification rules and the per-session slot (notify.rs, session.rs)
/// - Search and statistics over snapshots (search.rs, stats.rs)

pub mod data;
pub mod error;
pub mod library;
pub mod notify;
pub mod reconcile;
pub mod search;
pub mod session;
pub mod stats;
