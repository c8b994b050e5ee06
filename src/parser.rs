//! Markdown page parsing.
//!
//! Turns one markdown file into a [`PageRecord`]: optional YAML front matter
//! is split off, headings are collected line by line, and the title falls
//! back from front matter to the first heading to the file name.
//!
//! Malformed front matter never fails a page. It is treated as if there were
//! no front matter at all: the whole file, delimiters included, is body.

use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DocsError, DocsResult};
use crate::models::PageRecord;
use crate::uri;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}[ \t]+(.*)$").unwrap());

/// Metadata recovered from a well-formed front matter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: Option<String>,
}

/// Parses the markdown file at `path`, which must live under `docs_root`.
pub fn parse_page(path: &Path, docs_root: &Path) -> DocsResult<PageRecord> {
    let bytes = std::fs::read(path).map_err(|e| DocsError::from_io(path, e))?;
    let last_modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    let relative_path = uri::relative_path(path, docs_root).ok_or_else(|| {
        DocsError::PathTraversal(format!(
            "{} is not inside {}",
            path.display(),
            docs_root.display()
        ))
    })?;

    let text = String::from_utf8_lossy(&bytes);
    let (front_matter, body) = split_front_matter(&text);
    let headings = extract_headings(body);

    let title = front_matter
        .and_then(|fm| fm.title)
        .or_else(|| headings.first().cloned())
        .unwrap_or_else(|| title_from_file_name(path));

    Ok(PageRecord {
        uri: uri::encode(&relative_path),
        title,
        relative_path,
        headings,
        checksum: hex::encode(Sha256::digest(&bytes)),
        last_modified,
    })
}

/// Splits a leading `---` delimited block from the body.
///
/// Returns `None` for the metadata when there is no complete block or the
/// block is not a YAML mapping; the body is then the whole text. Otherwise
/// the body is everything after the closing delimiter.
pub fn split_front_matter(text: &str) -> (Option<FrontMatter>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut lines = text.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return (None, text),
    }

    let yaml_start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
    let mut offset = yaml_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &text[yaml_start..offset];
            return match parse_yaml(yaml) {
                Some(front_matter) => (Some(front_matter), &text[offset + line.len()..]),
                None => (None, text),
            };
        }
        offset += line.len();
    }

    // Opening delimiter with no closing one: treat as ordinary content.
    (None, text)
}

fn parse_yaml(yaml: &str) -> Option<FrontMatter> {
    match serde_yaml::from_str::<serde_yaml::Value>(yaml) {
        Ok(serde_yaml::Value::Mapping(map)) => {
            let title = map
                .get("title")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            Some(FrontMatter { title })
        }
        Ok(serde_yaml::Value::Null) => Some(FrontMatter::default()),
        Ok(_) => {
            tracing::debug!("front matter is not a mapping; ignoring it");
            None
        }
        Err(err) => {
            tracing::debug!(error = %err, "malformed front matter; ignoring it");
            None
        }
    }
}

/// Collects `#`..`######` heading texts in document order.
///
/// Headings with no text after the marker are skipped.
pub fn extract_headings(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| HEADING_RE.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

fn title_from_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(".md") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => name,
    }
}
