//! Core data models used throughout the docs catalog.
//!
//! These types represent the indexed pages, the swappable index snapshot, and
//! the response shapes returned by the catalog operations. Response types
//! serialize with camelCase keys, which is the wire shape clients see.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// One indexed documentation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub uri: String,
    pub title: String,
    pub relative_path: String,
    pub headings: Vec<String>,
    pub checksum: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
}

/// Immutable snapshot of the index. Replaced wholesale on every refresh.
#[derive(Debug, Clone, Default)]
pub struct IndexState {
    pub pages: Vec<PageRecord>,
    pub commit: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub docs_dir_resolved: PathBuf,
    pub discovery_warnings: Vec<String>,
}

/// Result of a repository synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub commit: String,
    pub changed: bool,
}

/// A page as it appears in `list` results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub uri: String,
    pub title: String,
    pub relative_path: String,
    pub headings: Vec<String>,
}

/// A page as it appears inside a folder group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEntry {
    pub uri: String,
    pub title: String,
    pub relative_path: String,
}

/// Folder-based partition of the filtered page set.
#[derive(Debug, Clone, Serialize)]
pub struct PageGroup {
    pub folder: String,
    pub count: usize,
    pub pages: Vec<GroupEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub query: Option<String>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub count: usize,
    pub results: Vec<PageSummary>,
    pub groups: Vec<PageGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadResult {
    pub uri: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResult {
    pub ok: bool,
    pub force_rebuild: bool,
    pub commit: String,
    pub changed: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub repo_url: String,
    pub branch: String,
    pub commit: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub pages: usize,
    pub docs_dir_resolved: String,
    pub docs_dir_exists: bool,
    pub discovery_warnings: Vec<String>,
    pub cache_dir: String,
}

/// Payload of the `feathers-doc://docs/{path}` resource template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResult {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}
