//! The pending-input queue.
//!
//! Entries are identified by position only. Two files with the same name and
//! size are two entries; nothing is deduplicated and nothing is reordered.

use crate::error::DocLensError;
use bytes::Bytes;
use std::path::Path;
use tracing::debug;

/// Content types the conversion service accepts.
pub const SUPPORTED_CONTENT_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/bmp",
    "image/tiff",
    "application/pdf",
];

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// One user-selected input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    name: String,
    content_type: String,
    content: Bytes,
}

impl FileEntry {
    /// Wrap in-memory bytes. The content type is guessed from `name`.
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let name = name.into();
        let content_type = guess_content_type(&name).to_string();
        Self {
            name,
            content_type,
            content: content.into(),
        }
    }

    /// Read a local file into a new entry named after its final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, DocLensError> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DocLensError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => DocLensError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => DocLensError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Read {} ({} bytes)", path.display(), content.len());
        Ok(Self::new(name, content))
    }

    /// Override the guessed content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The raw file bytes. Cloning a `Bytes` is a reference-count bump.
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Whether the service is expected to accept this file's content type.
    pub fn is_supported(&self) -> bool {
        SUPPORTED_CONTENT_TYPES.contains(&self.content_type.as_str())
    }
}

/// Guess a MIME type from a filename's extension.
pub fn guess_content_type(name: &str) -> &'static str {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

/// Ordered sequence of pending inputs.
#[derive(Debug, Clone, Default)]
pub struct FileQueue {
    entries: Vec<FileEntry>,
}

impl FileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append all `entries` in order. Never rejects.
    pub fn add(&mut self, entries: impl IntoIterator<Item = FileEntry>) {
        self.entries.extend(entries);
    }

    /// Remove the entry at `index`.
    ///
    /// An invalid index returns [`DocLensError::IndexOutOfRange`] and leaves
    /// the queue untouched.
    pub fn remove_at(&mut self, index: usize) -> Result<FileEntry, DocLensError> {
        if index >= self.entries.len() {
            return Err(DocLensError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sum of every entry's byte size.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(FileEntry::byte_size).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&FileEntry> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }

    /// Entries whose content type the service will refuse.
    pub fn unsupported(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter().filter(|e| !e.is_supported())
    }
}

impl<'a> IntoIterator for &'a FileQueue {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Resolve a list of paths into entries, stopping at the first unreadable one.
pub async fn read_entries<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<FileEntry>, DocLensError> {
    let mut entries = Vec::with_capacity(paths.len());
    for p in paths {
        entries.push(FileEntry::from_path(p).await?);
    }
    Ok(entries)
}

/// Display helper: `1.9 MB`, `512 B`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
