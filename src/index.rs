//! The in-memory docs index and its serving operations.
//!
//! [`DocsIndex`] owns the current [`IndexState`] snapshot behind an
//! `RwLock<Arc<_>>`. Queries clone the `Arc` and work on that snapshot, so a
//! refresh in progress never blocks them and they never see a half-built
//! index. Refreshes are serialized by an async mutex and publish their result
//! with a single pointer swap.
//!
//! # Refresh pipeline
//!
//! ```text
//! RepoSync ──▶ discover_markdown ──▶ parse_page (per file) ──▶ swap snapshot
//! ```

use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{Config, MAX_PAGE_SIZE};
use crate::discovery::discover_markdown;
use crate::error::{DocsError, DocsResult};
use crate::models::{
    GroupEntry, IndexState, ListResult, PageGroup, PageRecord, PageSummary, ReadResult,
    RefreshResult, ResourceResult, StatusResult,
};
use crate::parser::parse_page;
use crate::sync::RepoSync;
use crate::uri;

/// Headings included per `list` result.
pub const MAX_RESULT_HEADINGS: usize = 8;

/// MIME type of page content served through the resource template.
pub const MARKDOWN_MIME: &str = "text/markdown";

/// Folder label for pages directly under the docs root.
const ROOT_FOLDER: &str = "/";

/// Validated arguments for [`DocsIndex::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    query: Option<String>,
    limit: usize,
    offset: usize,
}

impl ListQuery {
    /// Checks ranges: `limit` must be 1–20 (default `default_limit`), `offset`
    /// must be non-negative (default 0). The query is kept exactly as given;
    /// an empty one matches every page.
    pub fn new(
        query: Option<String>,
        limit: Option<i64>,
        offset: Option<i64>,
        default_limit: usize,
    ) -> DocsResult<Self> {
        let limit = match limit {
            None => default_limit,
            Some(n) if (1..=MAX_PAGE_SIZE as i64).contains(&n) => n as usize,
            Some(n) => {
                return Err(DocsError::InvalidArgument(format!(
                    "limit must be between 1 and {}, got {}",
                    MAX_PAGE_SIZE, n
                )))
            }
        };
        let offset = match offset {
            None => 0,
            Some(n) if n >= 0 => n as usize,
            Some(n) => {
                return Err(DocsError::InvalidArgument(format!(
                    "offset must be >= 0, got {}",
                    n
                )))
            }
        };
        Ok(Self {
            query,
            limit,
            offset,
        })
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// The process-wide docs index.
pub struct DocsIndex {
    config: Arc<Config>,
    repo_sync: Arc<dyn RepoSync>,
    state: RwLock<Arc<IndexState>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl DocsIndex {
    /// Creates an empty index. Call [`refresh`](Self::refresh) before serving.
    pub fn new(config: Arc<Config>, repo_sync: Arc<dyn RepoSync>) -> Self {
        let initial = IndexState {
            docs_dir_resolved: config.docs_dir(),
            ..IndexState::default()
        };
        Self {
            config,
            repo_sync,
            state: RwLock::new(Arc::new(initial)),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The current snapshot. Cheap; holds the lock only to clone the `Arc`.
    pub fn snapshot(&self) -> Arc<IndexState> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-synchronizes the repository and rebuilds the index.
    ///
    /// Fails with [`DocsError::Sync`] when the repository sync fails and with
    /// [`DocsError::Internal`] when the index build task dies; either way the
    /// previous snapshot stays in place. `force_rebuild` is reported back but does not
    /// change behavior: every refresh rebuilds from scratch.
    pub async fn refresh(&self, force_rebuild: bool) -> DocsResult<RefreshResult> {
        let _guard = self.refresh_lock.lock().await;

        let outcome = match self.repo_sync.sync(&self.config).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "refresh aborted; keeping previous index");
                return Err(err);
            }
        };

        let docs_dir = self.config.docs_dir();
        let commit = outcome.commit.clone();
        let state = tokio::task::spawn_blocking(move || build_state(docs_dir, commit))
            .await
            .map_err(build_task_error)?;

        for warning in &state.discovery_warnings {
            tracing::warn!("{}", warning);
        }
        tracing::info!(
            commit = %state.commit,
            changed = outcome.changed,
            pages = state.pages.len(),
            "docs index refreshed"
        );

        let result = RefreshResult {
            ok: true,
            force_rebuild,
            commit: state.commit.clone(),
            changed: outcome.changed,
            last_sync_at: state.last_sync_at,
            pages: state.pages.len(),
        };

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(state);
        Ok(result)
    }

    /// Filters, paginates, and groups the current snapshot.
    pub fn list(&self, query: &ListQuery) -> ListResult {
        query_pages(&self.snapshot(), query)
    }

    /// Reads the current on-disk content of the page named by `uri`.
    pub async fn read(&self, uri: &str) -> DocsResult<ReadResult> {
        let path = uri::decode(uri, &self.config.docs_dir())?;
        let content = read_text(&path).await?;
        Ok(ReadResult {
            uri: uri.to_string(),
            content,
        })
    }

    /// Serves the `feathers-doc://docs/{path}` template for an already
    /// decoded relative `path`.
    pub async fn resource(&self, relative: &str) -> DocsResult<ResourceResult> {
        let docs_dir = self.config.docs_dir();
        let path = uri::resolve_relative(relative, &docs_dir)?;
        let text = read_text(&path).await?;
        let normalized = uri::relative_path(&path, &uri::canonical_root(&docs_dir))
            .unwrap_or_else(|| relative.to_string());
        Ok(ResourceResult {
            uri: uri::encode(&normalized),
            mime_type: MARKDOWN_MIME.to_string(),
            text,
        })
    }

    /// Serves the resource template for a full `feathers-doc://docs/...` uri.
    pub async fn resource_by_uri(&self, uri: &str) -> DocsResult<ResourceResult> {
        let read = self.read(uri).await?;
        Ok(ResourceResult {
            uri: read.uri,
            mime_type: MARKDOWN_MIME.to_string(),
            text: read.content,
        })
    }

    /// Reports sync metadata plus a live check of the docs root.
    pub fn status(&self) -> StatusResult {
        let state = self.snapshot();
        StatusResult {
            repo_url: self.config.repo.url.clone(),
            branch: self.config.repo.branch.clone(),
            commit: state.commit.clone(),
            last_sync_at: state.last_sync_at,
            pages: state.pages.len(),
            docs_dir_resolved: state.docs_dir_resolved.display().to_string(),
            docs_dir_exists: state.docs_dir_resolved.is_dir(),
            discovery_warnings: state.discovery_warnings.clone(),
            cache_dir: self.config.repo.cache_dir.display().to_string(),
        }
    }
}

/// Maps a panicked or cancelled index build to [`DocsError::Internal`].
fn build_task_error(err: tokio::task::JoinError) -> DocsError {
    tracing::error!(error = %err, "index build task failed; keeping previous index");
    DocsError::Internal(format!("index build step failed: {}", err))
}

async fn read_text(path: &Path) -> DocsResult<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DocsError::from_io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Builds a fresh snapshot from the docs tree. Never fails: problems become
/// discovery warnings.
fn build_state(docs_dir: PathBuf, commit: String) -> IndexState {
    let mut warnings = Vec::new();
    let dir_exists = docs_dir.is_dir();
    if !dir_exists {
        warnings.push(format!("docs directory not found: {}", docs_dir.display()));
    }

    let discovered = discover_markdown(&docs_dir);
    warnings.extend(discovered.warnings);

    let mut pages = Vec::with_capacity(discovered.files.len());
    for path in &discovered.files {
        match parse_page(path, &docs_dir) {
            Ok(page) => {
                tracing::debug!(path = %page.relative_path, headings = page.headings.len(), "parsed page");
                pages.push(page);
            }
            Err(err) => warnings.push(format!("skipped {}: {}", path.display(), err)),
        }
    }

    if dir_exists && pages.is_empty() {
        warnings.push(format!(
            "no markdown pages found in {}",
            docs_dir.display()
        ));
    }

    IndexState {
        pages,
        commit,
        last_sync_at: Some(Utc::now()),
        docs_dir_resolved: docs_dir,
        discovery_warnings: warnings,
    }
}

fn matches_query(page: &PageRecord, needle: &str) -> bool {
    page.title.to_lowercase().contains(needle)
        || page.relative_path.to_lowercase().contains(needle)
        || page
            .headings
            .iter()
            .any(|h| h.to_lowercase().contains(needle))
}

fn parent_folder(relative_path: &str) -> &str {
    relative_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or(ROOT_FOLDER)
}

/// The pure query behind [`DocsIndex::list`].
///
/// `groups` covers every filtered page, not just the returned window.
pub fn query_pages(state: &IndexState, query: &ListQuery) -> ListResult {
    let needle = query.query().map(str::to_lowercase);
    let filtered: Vec<&PageRecord> = state
        .pages
        .iter()
        .filter(|page| match &needle {
            Some(needle) => matches_query(page, needle),
            None => true,
        })
        .collect();

    let total = filtered.len();
    let results: Vec<PageSummary> = filtered
        .iter()
        .skip(query.offset())
        .take(query.limit())
        .map(|page| PageSummary {
            uri: page.uri.clone(),
            title: page.title.clone(),
            relative_path: page.relative_path.clone(),
            headings: page
                .headings
                .iter()
                .take(MAX_RESULT_HEADINGS)
                .cloned()
                .collect(),
        })
        .collect();

    let mut by_folder: BTreeMap<&str, Vec<GroupEntry>> = BTreeMap::new();
    for page in &filtered {
        by_folder
            .entry(parent_folder(&page.relative_path))
            .or_default()
            .push(GroupEntry {
                uri: page.uri.clone(),
                title: page.title.clone(),
                relative_path: page.relative_path.clone(),
            });
    }
    let groups = by_folder
        .into_iter()
        .map(|(folder, mut pages)| {
            pages.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
            PageGroup {
                folder: folder.to_string(),
                count: pages.len(),
                pages,
            }
        })
        .collect();

    ListResult {
        query: query.query().map(str::to_string),
        total,
        offset: query.offset(),
        limit: query.limit(),
        count: results.len(),
        results,
        groups,
    }
}
