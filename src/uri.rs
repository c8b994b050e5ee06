//! Page identifiers and path-safety resolution.
//!
//! Pages are addressed as `feathers-doc://docs/<relativePath>`. Encoding is a
//! pure string transform; decoding maps an identifier back to a file under
//! the docs root and rejects anything that would land outside it. Decoding
//! never reads file content, so a rejected identifier costs no I/O beyond
//! path canonicalization.

use std::path::{Component, Path, PathBuf};

use crate::error::{DocsError, DocsResult};

/// Required prefix of every page identifier.
pub const URI_PREFIX: &str = "feathers-doc://docs/";

/// Resource template advertised to MCP clients.
pub const URI_TEMPLATE: &str = "feathers-doc://docs/{path}";

/// Builds the identifier for a forward-slash relative path.
///
/// Each segment is percent-encoded so that [`decode`] recovers the exact
/// path, including names containing `%`, spaces, or `#`.
pub fn encode(relative_path: &str) -> String {
    let encoded = relative_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}{}", URI_PREFIX, encoded)
}

/// Resolves an identifier to an absolute path inside `docs_root`.
///
/// Fails with [`DocsError::InvalidUri`] when the prefix is wrong or the
/// remainder is empty or not valid percent-encoding, and with
/// [`DocsError::PathTraversal`] when the path is absolute, climbs out of the
/// root, or (for existing files) resolves through a link to somewhere outside
/// the canonical root.
pub fn decode(uri: &str, docs_root: &Path) -> DocsResult<PathBuf> {
    let rest = uri.strip_prefix(URI_PREFIX).ok_or_else(|| {
        DocsError::InvalidUri(format!("expected '{}' prefix: {}", URI_PREFIX, uri))
    })?;
    let decoded = urlencoding::decode(rest)
        .map_err(|e| DocsError::InvalidUri(format!("{}: {}", uri, e)))?;
    resolve_relative(&decoded, docs_root)
}

/// Resolves an already-decoded relative path (the `{path}` of the resource
/// template) inside `docs_root` with the same containment rules as
/// [`decode`].
pub fn resolve_relative(relative: &str, docs_root: &Path) -> DocsResult<PathBuf> {
    if relative.is_empty() {
        return Err(DocsError::InvalidUri("identifier names no page".to_string()));
    }
    if relative.contains('\0') {
        return Err(DocsError::InvalidUri(
            "identifier contains a NUL byte".to_string(),
        ));
    }

    // Backslashes count as separators on every host.
    let normalized = relative.replace('\\', "/");
    if normalized.starts_with('/') {
        return Err(DocsError::PathTraversal(format!(
            "absolute path not allowed: {}",
            relative
        )));
    }

    let mut parts: Vec<&str> = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(DocsError::PathTraversal(format!(
                        "path escapes docs root: {}",
                        relative
                    )));
                }
            }
            other => {
                let mut components = Path::new(other).components();
                let is_plain = matches!(
                    (components.next(), components.next()),
                    (Some(Component::Normal(_)), None)
                );
                if !is_plain {
                    return Err(DocsError::PathTraversal(format!(
                        "path segment not allowed: {}",
                        other
                    )));
                }
                parts.push(other);
            }
        }
    }
    if parts.is_empty() {
        return Err(DocsError::InvalidUri(format!(
            "identifier names no page: {}",
            relative
        )));
    }

    let root = canonical_root(docs_root);
    let candidate = parts.iter().fold(root.clone(), |acc, p| acc.join(p));

    // Links inside the tree may point anywhere; check where they really go.
    if let Ok(real) = candidate.canonicalize() {
        if !real.starts_with(&root) {
            return Err(DocsError::PathTraversal(format!(
                "path resolves outside docs root: {}",
                relative
            )));
        }
    }

    Ok(candidate)
}

/// Canonical form of the docs root, falling back to an absolute lexical path
/// when the directory does not exist.
pub fn canonical_root(docs_root: &Path) -> PathBuf {
    docs_root
        .canonicalize()
        .or_else(|_| std::path::absolute(docs_root))
        .unwrap_or_else(|_| docs_root.to_path_buf())
}

/// Path of `path` relative to `root`, joined with forward slashes.
///
/// Returns `None` when `path` is not below `root` or equals it.
pub fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn docs_root() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("docs");
        std::fs::create_dir_all(root.join("api")).unwrap();
        std::fs::write(root.join("api/index.md"), "# API").unwrap();
        let canonical = root.canonicalize().unwrap();
        (tmp, canonical)
    }

    #[test]
    fn test_encode_plain_path() {
        assert_eq!(encode("api/index.md"), "feathers-doc://docs/api/index.md");
    }

    #[test]
    fn test_encode_escapes_reserved_characters() {
        assert_eq!(
            encode("guides/getting started.md"),
            "feathers-doc://docs/guides/getting%20started.md"
        );
        assert_eq!(encode("100%.md"), "feathers-doc://docs/100%25.md");
    }

    #[test]
    fn test_roundtrip_resolves_to_root_join() {
        let (_tmp, root) = docs_root();
        for rel in ["api/index.md", "guides/getting started.md", "a#b/c?.md"] {
            let path = decode(&encode(rel), &root).unwrap();
            assert_eq!(path, root.join(rel));
        }
    }

    #[test]
    fn test_wrong_scheme_is_invalid_uri() {
        let (_tmp, root) = docs_root();
        for uri in [
            "https://docs/api/index.md",
            "feathers-doc://api/index.md",
            "api/index.md",
            "",
        ] {
            let err = decode(uri, &root).unwrap_err();
            assert!(matches!(err, DocsError::InvalidUri(_)), "{}: {:?}", uri, err);
        }
    }

    #[test]
    fn test_empty_remainder_is_invalid_uri() {
        let (_tmp, root) = docs_root();
        let err = decode("feathers-doc://docs/", &root).unwrap_err();
        assert!(matches!(err, DocsError::InvalidUri(_)));
    }

    #[test]
    fn test_dotdot_escape_rejected() {
        let (_tmp, root) = docs_root();
        let err = decode("feathers-doc://docs/../../etc/passwd", &root).unwrap_err();
        assert!(matches!(err, DocsError::PathTraversal(_)));
    }

    #[test]
    fn test_encoded_dotdot_escape_rejected() {
        let (_tmp, root) = docs_root();
        let err = decode("feathers-doc://docs/%2E%2E/%2e%2e/etc/passwd", &root).unwrap_err();
        assert!(matches!(err, DocsError::PathTraversal(_)));
        let err = decode("feathers-doc://docs/api%2F..%2F..%2Fsecret", &root).unwrap_err();
        assert!(matches!(err, DocsError::PathTraversal(_)));
    }

    #[test]
    fn test_absolute_override_rejected() {
        let (_tmp, root) = docs_root();
        let err = decode("feathers-doc://docs//etc/passwd", &root).unwrap_err();
        assert!(matches!(err, DocsError::PathTraversal(_)));
        let err = decode("feathers-doc://docs/%2Fetc%2Fpasswd", &root).unwrap_err();
        assert!(matches!(err, DocsError::PathTraversal(_)));
    }

    #[test]
    fn test_backslash_escape_rejected() {
        let (_tmp, root) = docs_root();
        let err = decode("feathers-doc://docs/..%5C..%5Csecret", &root).unwrap_err();
        assert!(matches!(err, DocsError::PathTraversal(_)));
    }

    #[test]
    fn test_inner_dotdot_that_stays_inside_is_allowed() {
        let (_tmp, root) = docs_root();
        let path = decode("feathers-doc://docs/guides/../api/index.md", &root).unwrap();
        assert_eq!(path, root.join("api/index.md"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_root_rejected() {
        let (tmp, root) = docs_root();
        let secret = tmp.path().join("secret.md");
        std::fs::write(&secret, "top secret").unwrap();
        std::os::unix::fs::symlink(&secret, root.join("leak.md")).unwrap();
        let err = decode("feathers-doc://docs/leak.md", &root).unwrap_err();
        assert!(matches!(err, DocsError::PathTraversal(_)));
    }

    #[test]
    fn test_missing_root_still_resolves_lexically() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("nope");
        let path = decode("feathers-doc://docs/a.md", &root).unwrap();
        assert!(path.ends_with("nope/a.md"));
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/srv/docs");
        assert_eq!(
            relative_path(&root.join("api").join("index.md"), root).as_deref(),
            Some("api/index.md")
        );
        assert_eq!(relative_path(root, root), None);
        assert_eq!(relative_path(Path::new("/elsewhere/x.md"), root), None);
    }
}
