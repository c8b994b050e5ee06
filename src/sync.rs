//! Repository synchronization.
//!
//! [`RepoSync`] is the seam between the index and whatever keeps the local
//! working copy current. [`GitRepoSync`] drives the `git` binary:
//!
//! 1. No working copy yet: shallow, single-branch clone of the configured
//!    branch into `<cache_dir>/repo`. A non-empty directory there that is
//!    not a working copy is never deleted; the sync fails instead.
//! 2. Working copy present: fetch the branch and hard-reset to the fetched
//!    tip, discarding any local divergence.
//! 3. Report the resulting HEAD commit and whether it moved.

use async_trait::async_trait;
use std::path::Path;
use std::process::Command;

use crate::config::Config;
use crate::error::{DocsError, DocsResult};
use crate::models::SyncOutcome;

/// Brings the local working copy to the tip of the configured branch.
#[async_trait]
pub trait RepoSync: Send + Sync {
    /// Synchronizes and returns the checked-out commit.
    ///
    /// `changed` is true when HEAD differs from what it was before the call
    /// (always true for a fresh clone).
    async fn sync(&self, config: &Config) -> DocsResult<SyncOutcome>;
}

/// [`RepoSync`] backed by the `git` command-line client.
#[derive(Debug, Default, Clone)]
pub struct GitRepoSync;

impl GitRepoSync {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RepoSync for GitRepoSync {
    async fn sync(&self, config: &Config) -> DocsResult<SyncOutcome> {
        let url = config.repo.url.clone();
        let branch = config.repo.branch.clone();
        let repo_dir = config.repo_dir();

        tokio::task::spawn_blocking(move || sync_blocking(&url, &branch, &repo_dir))
            .await
            .map_err(|e| DocsError::Sync(format!("sync task failed: {}", e)))?
    }
}

fn sync_blocking(url: &str, branch: &str, repo_dir: &Path) -> DocsResult<SyncOutcome> {
    if repo_dir.join(".git").exists() {
        let before = git_head_sha(repo_dir).ok();
        git_fetch_reset(repo_dir, branch)?;
        let commit = git_head_sha(repo_dir)?;
        let changed = before.as_deref() != Some(commit.as_str());
        tracing::debug!(commit = %commit, changed, "fetched existing working copy");
        Ok(SyncOutcome { commit, changed })
    } else {
        git_clone(url, branch, repo_dir)?;
        let commit = git_head_sha(repo_dir)?;
        tracing::info!(url = %url, branch = %branch, commit = %commit, "cloned repository");
        Ok(SyncOutcome {
            commit,
            changed: true,
        })
    }
}

fn git_clone(url: &str, branch: &str, dest: &Path) -> DocsResult<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            DocsError::Sync(format!(
                "failed to create cache directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    ensure_clone_target(dest)?;

    let mut cmd = Command::new("git");
    cmd.args(["clone", "--depth", "1", "--single-branch", "--branch", branch]);
    cmd.arg(url);
    cmd.arg(dest);
    run_git(&mut cmd, "clone")?;
    Ok(())
}

/// `git clone` accepts a missing or empty directory. Anything else at `dest`
/// is left untouched and reported.
fn ensure_clone_target(dest: &Path) -> DocsResult<()> {
    if !dest.exists() {
        return Ok(());
    }
    let is_empty_dir = dest.is_dir()
        && std::fs::read_dir(dest)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
    if is_empty_dir {
        return Ok(());
    }
    Err(DocsError::Sync(format!(
        "{} exists but is not a git working copy; remove it or point cache_dir elsewhere",
        dest.display()
    )))
}

fn git_fetch_reset(repo_dir: &Path, branch: &str) -> DocsResult<()> {
    let mut fetch = Command::new("git");
    fetch
        .args(["fetch", "--depth", "1", "origin", branch])
        .current_dir(repo_dir);
    run_git(&mut fetch, "fetch")?;

    let mut reset = Command::new("git");
    reset
        .args(["reset", "--hard", "FETCH_HEAD"])
        .current_dir(repo_dir);
    run_git(&mut reset, "reset")?;
    Ok(())
}

fn git_head_sha(repo_dir: &Path) -> DocsResult<String> {
    let mut cmd = Command::new("git");
    cmd.args(["rev-parse", "HEAD"]).current_dir(repo_dir);
    let stdout = run_git(&mut cmd, "rev-parse HEAD")?;
    Ok(stdout.trim().to_string())
}

fn run_git(cmd: &mut Command, what: &str) -> DocsResult<String> {
    let output = cmd.output().map_err(|e| {
        DocsError::Sync(format!(
            "failed to execute 'git {}': {}. Is git installed?",
            what, e
        ))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DocsError::Sync(format!(
            "git {} failed: {}",
            what,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// True when a `git` binary is on `PATH`.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
