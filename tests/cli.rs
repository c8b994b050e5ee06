//! Binary smoke tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_feathers-docs"))
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(["-c", "user.name=Docs Test", "-c", "user.email=docs@example.com"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
        .status;
    assert!(status.success(), "git {:?} failed", args);
}

/// Writes a config whose repository is a local origin with two pages.
fn setup(tmp: &TempDir) -> PathBuf {
    let origin = tmp.path().join("origin");
    fs::create_dir_all(origin.join("docs/api")).unwrap();
    fs::write(origin.join("docs/index.md"), "# Feathers\n").unwrap();
    fs::write(
        origin.join("docs/api/hooks.md"),
        "---\ntitle: Hooks API\n---\n## before\n",
    )
    .unwrap();
    git(&origin, &["init", "-q"]);
    git(&origin, &["checkout", "-q", "-b", "dove"]);
    git(&origin, &["add", "-A"]);
    git(&origin, &["commit", "-q", "-m", "docs"]);

    let config_path = tmp.path().join("feathers-docs.toml");
    fs::write(
        &config_path,
        format!(
            "[repo]\nurl = \"file://{}\"\nbranch = \"dove\"\ncache_dir = \"{}\"\n",
            origin.display(),
            tmp.path().join("cache").display()
        ),
    )
    .unwrap();
    config_path
}

fn run(config: &Path, args: &[&str]) -> std::process::Output {
    Command::new(binary())
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("FEATHERS_DOCS_REPO_URL")
        .env_remove("FEATHERS_DOCS_BRANCH")
        .env_remove("FEATHERS_DOCS_CACHE_DIR")
        .env_remove("FEATHERS_DOCS_TOP_K")
        .output()
        .unwrap()
}

#[test]
fn test_invalid_limit_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("feathers-docs.toml");
    fs::write(
        &config,
        format!(
            "[repo]\nurl = \"file:///nonexistent\"\ncache_dir = \"{}\"\n",
            tmp.path().join("cache").display()
        ),
    )
    .unwrap();

    let output = run(&config, &["list", "--limit", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("limit"));
}

#[test]
fn test_list_and_status_print_json() {
    if !feathers_docs::sync::git_available() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let config = setup(&tmp);

    let output = run(&config, &["list", "--query", "hooks"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["results"][0]["title"], "Hooks API");

    let output = run(&config, &["status"]);
    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["pages"], 2);
    assert_eq!(status["branch"], "dove");

    let output = run(&config, &["read", "feathers-doc://docs/index.md"]);
    assert!(output.status.success());
    let read: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(read["content"], "# Feathers\n");
}
