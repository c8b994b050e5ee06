//! One-shot CLI commands and serving bootstrap.
//!
//! Every command builds a [`DocsIndex`] over the configured repository,
//! performs the initial refresh, then either prints one JSON result to stdout
//! or hands the index to a transport.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::index::{DocsIndex, ListQuery};
use crate::sync::{GitRepoSync, RepoSync};

/// Creates an index backed by the `git` client.
pub fn build_index(config: Config) -> Arc<DocsIndex> {
    build_index_with(config, Arc::new(GitRepoSync::new()))
}

/// Creates an index with a caller-supplied sync backend.
pub fn build_index_with(config: Config, repo_sync: Arc<dyn RepoSync>) -> Arc<DocsIndex> {
    Arc::new(DocsIndex::new(Arc::new(config), repo_sync))
}

/// Runs the first refresh. A failure is logged and the index stays empty so
/// the caller can still serve (and report the problem through status).
pub async fn initial_refresh(index: &DocsIndex) {
    match index.refresh(false).await {
        Ok(result) => {
            tracing::info!(commit = %result.commit, pages = result.pages, "initial refresh complete")
        }
        Err(err) => tracing::error!(error = %err, "initial refresh failed; serving an empty index"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    println!("{}", json);
    Ok(())
}

pub async fn run_list(
    index: &DocsIndex,
    query: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<()> {
    let query = ListQuery::new(query, limit, offset, index.config().top_k())?;
    initial_refresh(index).await;
    print_json(&index.list(&query))
}

pub async fn run_read(index: &DocsIndex, uri: &str) -> Result<()> {
    initial_refresh(index).await;
    let result = index
        .read(uri)
        .await
        .with_context(|| format!("failed to read {}", uri))?;
    print_json(&result)
}

pub async fn run_refresh(index: &DocsIndex, force_rebuild: bool) -> Result<()> {
    let result = index.refresh(force_rebuild).await?;
    print_json(&result)
}

pub async fn run_status(index: &DocsIndex) -> Result<()> {
    initial_refresh(index).await;
    print_json(&index.status())
}
