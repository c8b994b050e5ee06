//! Configuration loading and validation.
//!
//! Configuration comes from an optional TOML file, then environment
//! overrides are layered on top. The resulting [`Config`] is immutable for
//! the lifetime of the process.
//!
//! ```toml
//! [repo]
//! url = "https://github.com/feathersjs/feathers.git"
//! branch = "dove"
//! cache_dir = "~/.cache/feathers-docs"
//! docs_subdir = "docs"
//!
//! [retrieval]
//! top_k = 10
//!
//! [server]
//! bind = "127.0.0.1:7332"
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `FEATHERS_DOCS_REPO_URL` | `repo.url` |
//! | `FEATHERS_DOCS_BRANCH` | `repo.branch` |
//! | `FEATHERS_DOCS_CACHE_DIR` | `repo.cache_dir` |
//! | `FEATHERS_DOCS_TOP_K` | `retrieval.top_k` |
//! | `FEATHERS_DOCS_BIND` | `server.bind` |

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// Largest page size accepted by `list`.
pub const MAX_PAGE_SIZE: usize = 20;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepoConfig {
    #[serde(default = "default_repo_url")]
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_docs_subdir")]
    pub docs_subdir: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            url: default_repo_url(),
            branch: default_branch(),
            cache_dir: default_cache_dir(),
            docs_subdir: default_docs_subdir(),
        }
    }
}

fn default_repo_url() -> String {
    "https://github.com/feathersjs/feathers.git".to_string()
}
fn default_branch() -> String {
    "dove".to_string()
}
fn default_docs_subdir() -> String {
    "docs".to_string()
}

fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "feathers-docs")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".feathers-docs-cache"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7332".to_string()
}

impl Config {
    /// Local working copy of the mirrored repository.
    pub fn repo_dir(&self) -> PathBuf {
        self.repo.cache_dir.join("repo")
    }

    /// Docs root inside the working copy. May not exist.
    pub fn docs_dir(&self) -> PathBuf {
        self.repo_dir().join(&self.repo.docs_subdir)
    }

    /// Default page size for `list`.
    pub fn top_k(&self) -> usize {
        self.retrieval.top_k
    }

    /// Applies overrides from a variable lookup (normally `std::env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("FEATHERS_DOCS_REPO_URL") {
            self.repo.url = url;
        }
        if let Some(branch) = lookup("FEATHERS_DOCS_BRANCH") {
            self.repo.branch = branch;
        }
        if let Some(dir) = lookup("FEATHERS_DOCS_CACHE_DIR") {
            self.repo.cache_dir = PathBuf::from(dir);
        }
        if let Some(top_k) = lookup("FEATHERS_DOCS_TOP_K") {
            self.retrieval.top_k = top_k
                .trim()
                .parse()
                .with_context(|| format!("FEATHERS_DOCS_TOP_K is not an integer: '{}'", top_k))?;
        }
        if let Some(bind) = lookup("FEATHERS_DOCS_BIND") {
            self.server.bind = bind;
        }
        Ok(())
    }

    /// Expands `~/` and checks field constraints.
    pub fn finalize(mut self) -> Result<Self> {
        self.repo.cache_dir = expand_home(&self.repo.cache_dir);

        if self.repo.url.trim().is_empty() {
            bail!("repo.url must not be empty");
        }
        if self.repo.branch.trim().is_empty() {
            bail!("repo.branch must not be empty");
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.retrieval.top_k) {
            bail!(
                "retrieval.top_k must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                self.retrieval.top_k
            );
        }

        let subdir = Path::new(&self.repo.docs_subdir);
        let escapes = subdir
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if self.repo.docs_subdir.trim().is_empty() || escapes {
            bail!(
                "repo.docs_subdir must be a relative path inside the repository, got '{}'",
                self.repo.docs_subdir
            );
        }

        Ok(self)
    }
}

/// Reads and validates a TOML config file, then applies environment
/// overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.finalize()
}

/// Loads `path` if it exists; otherwise builds the config from defaults and
/// environment overrides alone.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_config(path);
    }
    let mut config = Config::default();
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.finalize()
}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match directories::BaseDirs::new() {
        Some(base) => base.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(toml_src: &str) -> Config {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn test_defaults_from_empty_file() {
        let cfg = parse("").finalize().unwrap();
        assert_eq!(cfg.repo.branch, "dove");
        assert_eq!(cfg.top_k(), 10);
        assert_eq!(cfg.repo.docs_subdir, "docs");
        assert!(cfg.docs_dir().ends_with("repo/docs"));
    }

    #[test]
    fn test_derived_directories() {
        let cfg = parse(
            r#"
[repo]
url = "https://example.com/repo.git"
branch = "main"
cache_dir = "/var/cache/fd"
"#,
        )
        .finalize()
        .unwrap();
        assert_eq!(cfg.repo_dir(), PathBuf::from("/var/cache/fd/repo"));
        assert_eq!(cfg.docs_dir(), PathBuf::from("/var/cache/fd/repo/docs"));
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let mut cfg = parse(
            r#"
[repo]
branch = "main"

[retrieval]
top_k = 5
"#,
        );
        let env: HashMap<&str, &str> = [
            ("FEATHERS_DOCS_BRANCH", "release"),
            ("FEATHERS_DOCS_TOP_K", "7"),
            ("FEATHERS_DOCS_BIND", "0.0.0.0:9000"),
        ]
        .into_iter()
        .collect();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        let cfg = cfg.finalize().unwrap();
        assert_eq!(cfg.repo.branch, "release");
        assert_eq!(cfg.top_k(), 7);
        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
    }

    #[test]
    fn test_non_numeric_top_k_override_rejected() {
        let mut cfg = Config::default();
        let result = cfg.apply_overrides(|k| {
            (k == "FEATHERS_DOCS_TOP_K").then(|| "lots".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_top_k_out_of_range_rejected() {
        for bad in ["0", "21"] {
            let cfg = parse(&format!("[retrieval]\ntop_k = {}\n", bad));
            assert!(cfg.finalize().is_err(), "top_k = {} should fail", bad);
        }
    }

    #[test]
    fn test_escaping_docs_subdir_rejected() {
        let cfg = parse("[repo]\ndocs_subdir = \"../etc\"\n");
        assert!(cfg.finalize().is_err());
        let cfg = parse("[repo]\ndocs_subdir = \"/abs\"\n");
        assert!(cfg.finalize().is_err());
    }

    #[test]
    fn test_empty_branch_rejected() {
        let cfg = parse("[repo]\nbranch = \"  \"\n");
        assert!(cfg.finalize().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("fd.toml");
        std::fs::write(
            &path,
            format!(
                "[repo]\nurl = \"file:///tmp/x\"\ncache_dir = \"{}\"\n",
                tmp.path().display()
            ),
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.repo_dir(), tmp.path().join("repo"));
    }

    #[test]
    fn test_load_config_missing_file_errors() {
        assert!(load_config(Path::new("/definitely/not/here.toml")).is_err());
    }
}
