//! Error types for the doclens-client library.
//!
//! Two very different kinds of failure exist in this crate:
//!
//! * [`DocLensError`]: **local** failures, where something on this side went wrong (bad
//!   queue index, unreadable input file, artifact could not be written to
//!   disk, invalid configuration). Returned as `Err(DocLensError)`.
//!
//! * Conversion failures reported by the service or the network are *not*
//!   errors of this type. They are classified by [`crate::interpret`] into a
//!   human-readable message and parked in the controller's `Error` state, so
//!   the caller can retry without re-selecting files.

use std::path::PathBuf;
use thiserror::Error;

/// All local errors returned by the doclens-client library.
#[derive(Debug, Error)]
pub enum DocLensError {
    // ── Queue errors ──────────────────────────────────────────────────────
    /// `remove_at` was called with an index past the end of the queue.
    #[error("File index {index} is out of range (queue has {len} files)")]
    IndexOutOfRange { index: usize, len: usize },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading an input file.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Artifact errors ───────────────────────────────────────────────────
    /// No converted document is available to download.
    #[error("No converted document is available; run a conversion first")]
    NoArtifact,

    /// The temp file backing a new artifact handle could not be created.
    #[error("Failed to store converted document: {source}")]
    ArtifactCreateFailed {
        #[source]
        source: std::io::Error,
    },

    /// Could not write the downloaded document to its destination.
    #[error("Failed to save document to '{path}': {source}")]
    DownloadWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
