//! Markdown discovery under the docs root.
//!
//! Walks the docs tree and collects every file whose name ends in `.md`
//! (case-sensitive). Output is sorted by full path string so repeated runs
//! over the same tree produce the same index order.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files found by a discovery pass, plus entries that could not be visited.
#[derive(Debug, Default)]
pub struct Discovered {
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Recursively enumerates markdown files under `docs_root`.
///
/// A missing root yields an empty result; the caller reports that as a
/// warning. Unreadable entries are skipped and recorded in
/// [`Discovered::warnings`]. Symlinks are not followed.
pub fn discover_markdown(docs_root: &Path) -> Discovered {
    let mut discovered = Discovered::default();
    if !docs_root.is_dir() {
        return discovered;
    }

    for entry in WalkDir::new(docs_root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let location = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| docs_root.display().to_string());
                tracing::warn!(path = %location, error = %err, "skipping unreadable docs entry");
                discovered
                    .warnings
                    .push(format!("skipped unreadable entry {}: {}", location, err));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if is_markdown(entry.path()) {
            discovered.files.push(entry.into_path());
        }
    }

    discovered
        .files
        .sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
    discovered
}

fn is_markdown(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(".md"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(root: &Path, found: &Discovered) -> Vec<String> {
        found
            .files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let found = discover_markdown(&tmp.path().join("docs"));
        assert!(found.files.is_empty());
        assert!(found.warnings.is_empty());
    }

    #[test]
    fn test_collects_only_md_suffix() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("api/hooks")).unwrap();
        fs::write(root.join("index.md"), "# Home").unwrap();
        fs::write(root.join("api/index.md"), "# API").unwrap();
        fs::write(root.join("api/hooks/before.md"), "# Before").unwrap();
        fs::write(root.join("README.MD"), "upper").unwrap();
        fs::write(root.join("notes.markdown"), "long").unwrap();
        fs::write(root.join("logo.png"), [0u8, 1, 2]).unwrap();

        let found = discover_markdown(root);
        assert_eq!(
            names(root, &found),
            vec!["api/hooks/before.md", "api/index.md", "index.md"]
        );
    }

    #[test]
    fn test_order_is_lexicographic_by_full_path() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a-b.md"), "").unwrap();
        fs::write(root.join("a/z.md"), "").unwrap();
        fs::write(root.join("B.md"), "").unwrap();

        let found = discover_markdown(root);
        // '-' (0x2d) sorts before '/' (0x2f); uppercase before lowercase.
        assert_eq!(names(root, &found), vec!["B.md", "a-b.md", "a/z.md"]);
    }

    #[test]
    fn test_directory_named_like_markdown_is_traversed_not_collected() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("odd.md")).unwrap();
        fs::write(root.join("odd.md/inner.md"), "").unwrap();

        let found = discover_markdown(root);
        assert_eq!(names(root, &found), vec!["odd.md/inner.md"]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        for i in 0..20 {
            fs::write(root.join(format!("page{}.md", i)), "").unwrap();
        }
        let first = discover_markdown(root).files;
        let second = discover_markdown(root).files;
        assert_eq!(first, second);
    }
}
