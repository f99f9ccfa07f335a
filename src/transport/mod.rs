//! The seam between the controller and the conversion service.
//!
//! The controller only depends on [`ConversionTransport`]. Production code
//! plugs in [`http::HttpTransport`]; tests plug in a scripted fake. Either
//! way a send resolves to a [`TransportResult`], which is handed untouched
//! to [`crate::interpret`].
//!
//! ## Data Flow
//!
//! ```text
//! controller ──▶ ConversionRequest ──▶ transport ──▶ TransportResult ──▶ interpret
//!   (queue snapshot + format)          (HTTP POST)    (bytes | error)
//! ```

pub mod http;

use crate::config::OutputFormat;
use crate::queue::FileEntry;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

pub use http::HttpTransport;

/// What a transport attempt resolves to.
///
/// `Ok` carries the response body of a 2xx answer. Everything else is a
/// [`TransportError`], which may still carry a body.
pub type TransportResult = Result<Bytes, TransportError>;

/// A snapshot of everything one conversion sends.
///
/// Taken when the busy phase begins so a retry re-sends exactly the queue
/// and format that were current at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub files: Vec<FileEntry>,
    pub format: OutputFormat,
}

impl ConversionRequest {
    pub fn new(files: Vec<FileEntry>, format: OutputFormat) -> Self {
        Self { files, format }
    }

    /// Total upload size in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(FileEntry::byte_size).sum()
    }

    /// Filename to save the result under.
    ///
    /// `{stem of first file}[_and_{N-1}_more]{extension}`, where a blank
    /// first name falls back to `document`.
    pub fn suggested_filename(&self) -> String {
        let stem = self
            .files
            .first()
            .map(|f| file_stem(f.name()))
            .filter(|s| !s.is_empty())
            .unwrap_or("document");

        let mut name = stem.to_string();
        if self.files.len() > 1 {
            name.push_str(&format!("_and_{}_more", self.files.len() - 1));
        }
        name.push_str(self.format.extension());
        name
    }
}

/// Final path component with its last extension removed.
///
/// `scan.png` → `scan`, `archive.tar.gz` → `archive.tar`, `.hidden` → `.hidden`.
fn file_stem(name: &str) -> &str {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or(name);
    match base.rfind('.') {
        Some(0) | None => base,
        Some(dot) => &base[..dot],
    }
}

/// A transport attempt that did not produce a 2xx answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    status: Option<u16>,
    body: Option<Bytes>,
    message: Option<String>,
}

impl TransportError {
    /// The service answered with a non-2xx status.
    pub fn http(status: u16, body: Option<Bytes>) -> Self {
        Self {
            status: Some(status),
            body,
            message: None,
        }
    }

    /// No response was received at all.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.message.as_deref()) {
            (Some(s), Some(m)) => write!(f, "HTTP {s}: {m}"),
            (Some(s), None) => write!(f, "HTTP {s}"),
            (None, Some(m)) => f.write_str(m),
            (None, None) => f.write_str("transport failure"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Sends a conversion request to the service.
///
/// Implementations must resolve every attempt, success or failure, to a
/// [`TransportResult`]. They never retry on their own.
#[async_trait]
pub trait ConversionTransport: Send + Sync {
    async fn send(&self, request: &ConversionRequest) -> TransportResult;
}

#[async_trait]
impl<T: ConversionTransport + ?Sized> ConversionTransport for std::sync::Arc<T> {
    async fn send(&self, request: &ConversionRequest) -> TransportResult {
        (**self).send(request).await
    }
}
