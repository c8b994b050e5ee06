//! Error taxonomy for the docs catalog.
//!
//! Every fallible catalog operation returns [`DocsError`]. Discovery problems
//! (missing docs directory, zero pages, unreadable entries) are never errors;
//! they are recorded as warnings on the index instead.

use thiserror::Error;

/// Errors surfaced by the catalog core.
#[derive(Debug, Error)]
pub enum DocsError {
    /// A request parameter is out of range or of the wrong type.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The identifier does not use the `feathers-doc://docs/` scheme or
    /// cannot be decoded.
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    /// The identifier resolves outside the docs root.
    #[error("path traversal rejected: {0}")]
    PathTraversal(String),

    /// The resolved page does not exist on disk.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The resolved page exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Repository synchronization failed; the previous index stays active.
    #[error("repository sync failed: {0}")]
    Sync(String),

    /// A bug inside the server, such as a panicked background task.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DocsError {
    /// Machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) | Self::InvalidUri(_) => "bad_request",
            Self::PathTraversal(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Read { .. } => "read_error",
            Self::Sync(_) => "sync_error",
            Self::Internal(_) => "internal",
        }
    }

    /// Maps an I/O failure on `path` to [`DocsError::NotFound`] or
    /// [`DocsError::Read`].
    pub fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.display().to_string())
        } else {
            Self::Read {
                path: path.display().to_string(),
                source: err,
            }
        }
    }

    /// True for errors caused by the caller's input rather than server state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::InvalidUri(_) | Self::PathTraversal(_)
        )
    }
}

/// Result alias for catalog operations.
pub type DocsResult<T> = Result<T, DocsError>;
