//! Lifecycle of the converted document.
//!
//! A published artifact lives in a managed temp file until it is saved,
//! superseded or released. Holding it on disk rather than in memory means a
//! large PDF is not kept twice. It also gives the handle a real host
//! resource to release. The manager keeps at most one live handle: `publish`
//! releases the previous one before creating the next, and `Drop` releases
//! whatever is left.

use crate::error::DocLensError;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// A cheap description of the live artifact.
///
/// Cloning it does not extend the artifact's lifetime; once the manager
/// releases the artifact, `path` no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub id: u64,
    pub path: PathBuf,
    pub filename: String,
    pub size: u64,
}

struct LiveArtifact {
    handle: ArtifactHandle,
    file: NamedTempFile,
}

/// Owns the downloadable result of the last successful conversion.
pub struct ArtifactManager {
    current: Option<LiveArtifact>,
    next_id: u64,
    scratch_dir: Option<PathBuf>,
}

impl Default for ArtifactManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArtifactManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactManager")
            .field("current", &self.current.as_ref().map(|a| &a.handle))
            .field("scratch_dir", &self.scratch_dir)
            .finish()
    }
}

impl ArtifactManager {
    /// Temp files go to the system temp directory.
    pub fn new() -> Self {
        Self {
            current: None,
            next_id: 1,
            scratch_dir: None,
        }
    }

    /// Temp files go to `dir`, which must exist.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let mut manager = Self::new();
        manager.scratch_dir = Some(dir.into());
        manager
    }

    /// Replace the current artifact with `bytes`, to be saved as `suggested_filename`.
    pub fn publish(
        &mut self,
        bytes: &[u8],
        suggested_filename: impl Into<String>,
    ) -> Result<ArtifactHandle, DocLensError> {
        self.release();

        let filename = suggested_filename.into();
        let suffix = Path::new(&filename)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut builder = tempfile::Builder::new();
        builder.prefix("doclens-").suffix(&suffix);
        let mut file = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|source| DocLensError::ArtifactCreateFailed { source })?;

        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|source| DocLensError::ArtifactCreateFailed { source })?;

        let handle = ArtifactHandle {
            id: self.next_id,
            path: file.path().to_path_buf(),
            filename,
            size: bytes.len() as u64,
        };
        self.next_id += 1;

        info!(
            "Published artifact #{} '{}' ({} bytes)",
            handle.id, handle.filename, handle.size
        );
        self.current = Some(LiveArtifact {
            handle: handle.clone(),
            file,
        });
        Ok(handle)
    }

    /// The live handle, if any.
    pub fn current(&self) -> Option<&ArtifactHandle> {
        self.current.as_ref().map(|a| &a.handle)
    }

    /// Number of live handles: always 0 or 1.
    pub fn live_handles(&self) -> usize {
        usize::from(self.current.is_some())
    }

    /// Read back the artifact's content.
    pub fn bytes(&self) -> Result<Bytes, DocLensError> {
        let live = self.current.as_ref().ok_or(DocLensError::NoArtifact)?;
        std::fs::read(live.file.path())
            .map(Bytes::from)
            .map_err(|e| DocLensError::Internal(format!("artifact read: {e}")))
    }

    /// Save the artifact into `dir` under its suggested filename.
    ///
    /// Uses atomic write (temp file + rename) so a crash never leaves a
    /// half-written document behind. Returns the final path.
    pub async fn trigger_download(&self, dir: impl AsRef<Path>) -> Result<PathBuf, DocLensError> {
        let live = self.current.as_ref().ok_or(DocLensError::NoArtifact)?;
        let dir = dir.as_ref();
        let dest = dir.join(&live.handle.filename);

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| DocLensError::DownloadWriteFailed {
                path: dest.clone(),
                source: e,
            })?;

        let tmp_path = dir.join(format!(".{}.part", live.handle.filename));
        tokio::fs::copy(live.file.path(), &tmp_path)
            .await
            .map_err(|e| DocLensError::DownloadWriteFailed {
                path: dest.clone(),
                source: e,
            })?;

        tokio::fs::rename(&tmp_path, &dest)
            .await
            .map_err(|e| DocLensError::DownloadWriteFailed {
                path: dest.clone(),
                source: e,
            })?;

        info!("Saved '{}' to {}", live.handle.filename, dest.display());
        Ok(dest)
    }

    /// Free the current artifact's temp file. Idempotent.
    pub fn release(&mut self) {
        if let Some(live) = self.current.take() {
            let id = live.handle.id;
            match live.file.close() {
                Ok(()) => debug!("Released artifact #{}", id),
                Err(e) => warn!("Failed to remove temp file for artifact #{}: {}", id, e),
            }
        }
    }
}

impl Drop for ArtifactManager {
    fn drop(&mut self) {
        self.release();
    }
}
