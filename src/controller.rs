//! The conversion state machine.
//!
//! ```text
//!            add_files / remove_file / set_format
//!                 ┌────┐
//!                 ▼    │
//!  ┌──────────▶ Idle ──┘
//!  │             │ convert (queue non-empty)
//!  │             ▼
//!  │        Uploading ──▶ Processing ─┬─ success ──▶ Completed ── reset ──┐
//!  │             ▲                    └─ failure ──▶ Error                │
//!  │             └────────── convert / retry ──────────┘                  │
//!  └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Uploading and Processing together form the busy phase. While busy every
//! mutating entry point returns [`Command::Rejected`] and leaves all state
//! untouched, so at most one request is ever outstanding. Guard failures are
//! never errors: they do not move the controller to `Error`.
//!
//! A conversion can be driven in one call with [`ConversionController::convert`],
//! or in steps with [`begin_convert`](ConversionController::begin_convert),
//! [`mark_processing`](ConversionController::mark_processing) and
//! [`finish`](ConversionController::finish) when the caller owns the
//! transport call itself.

use crate::artifact::{ArtifactHandle, ArtifactManager};
use crate::config::{ClientConfig, OutputFormat};
use crate::error::DocLensError;
use crate::interpret::{interpret, Outcome};
use crate::progress::Observer;
use crate::queue::{FileEntry, FileQueue};
use crate::transport::{ConversionRequest, ConversionTransport, HttpTransport, TransportResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the controller currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    #[default]
    Idle,
    Uploading,
    Processing,
    Completed,
    Error,
}

impl ConversionStatus {
    /// True while a request is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, ConversionStatus::Uploading | ConversionStatus::Processing)
    }

    /// Progress text for display.
    pub fn message(self) -> &'static str {
        match self {
            ConversionStatus::Idle => "Ready",
            ConversionStatus::Uploading => "Uploading files…",
            ConversionStatus::Processing => "Extracting text and rebuilding the document…",
            ConversionStatus::Completed => "Conversion complete",
            ConversionStatus::Error => "Conversion failed",
        }
    }
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversionStatus::Idle => "idle",
            ConversionStatus::Uploading => "uploading",
            ConversionStatus::Processing => "processing",
            ConversionStatus::Completed => "completed",
            ConversionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Whether an entry point was applied or refused by its guard.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Applied,
    Rejected,
}

impl Command {
    pub fn is_applied(self) -> bool {
        self == Command::Applied
    }
}

/// Orchestrates queue, format, transport and artifact for one user.
pub struct ConversionController<T> {
    transport: T,
    queue: FileQueue,
    format: OutputFormat,
    status: ConversionStatus,
    error_message: String,
    artifacts: ArtifactManager,
    in_flight: Option<ConversionRequest>,
    download_dir: PathBuf,
    observer: Option<Observer>,
}

impl ConversionController<HttpTransport> {
    /// A controller talking HTTP to the service named in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, DocLensError> {
        Ok(Self::new(HttpTransport::new(config)?, config))
    }
}

impl<T: ConversionTransport> ConversionController<T> {
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport,
            queue: FileQueue::new(),
            format: config.default_format,
            status: ConversionStatus::Idle,
            error_message: String::new(),
            artifacts: ArtifactManager::new(),
            in_flight: None,
            download_dir: config.download_dir.clone(),
            observer: None,
        }
    }

    /// Receive status events.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Keep artifact temp files under `artifacts` instead of the default.
    pub fn with_artifact_manager(mut self, artifacts: ArtifactManager) -> Self {
        self.artifacts = artifacts;
        self
    }

    // ── Read accessors ───────────────────────────────────────────────────

    pub fn status(&self) -> ConversionStatus {
        self.status
    }

    pub fn status_message(&self) -> &'static str {
        self.status.message()
    }

    pub fn is_busy(&self) -> bool {
        self.status.is_busy()
    }

    /// The last failure; empty unless the status is `Error`.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn queue(&self) -> &FileQueue {
        &self.queue
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// The request currently outstanding, or the one that last failed.
    pub fn last_request(&self) -> Option<&ConversionRequest> {
        self.in_flight.as_ref()
    }

    pub fn artifact(&self) -> Option<&ArtifactHandle> {
        self.artifacts.current()
    }

    pub fn artifact_bytes(&self) -> Result<Bytes, DocLensError> {
        self.artifacts.bytes()
    }

    pub fn live_artifacts(&self) -> usize {
        self.artifacts.live_handles()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ── Mutating entry points ────────────────────────────────────────────

    /// Append files to the queue.
    ///
    /// Clears any error and releases a previous artifact. From `Completed`
    /// this starts a fresh session, as if [`reset`](Self::reset) had been
    /// called first.
    pub fn add_files(&mut self, entries: impl IntoIterator<Item = FileEntry>) -> Command {
        if self.is_busy() {
            debug!("add_files rejected: conversion in progress");
            return Command::Rejected;
        }
        if self.status == ConversionStatus::Completed {
            let _ = self.reset();
        }

        let before = self.queue.len();
        self.queue.add(entries);
        debug!("Queued {} files ({} total)", self.queue.len() - before, self.queue.len());

        self.error_message.clear();
        self.artifacts.release();
        self.transition(ConversionStatus::Idle);
        Command::Applied
    }

    /// Remove the file at `index`.
    ///
    /// Allowed in `Idle` and `Error`. A bad index is an
    /// [`DocLensError::IndexOutOfRange`] and changes nothing.
    pub fn remove_file(&mut self, index: usize) -> Result<Command, DocLensError> {
        if !self.accepts_edits() {
            debug!("remove_file rejected in state {}", self.status);
            return Ok(Command::Rejected);
        }
        let removed = self.queue.remove_at(index)?;
        debug!("Removed '{}' from queue", removed.name());
        Ok(Command::Applied)
    }

    /// Select the output format. Allowed in `Idle` and `Error`.
    pub fn set_format(&mut self, format: OutputFormat) -> Command {
        if !self.accepts_edits() {
            debug!("set_format rejected in state {}", self.status);
            return Command::Rejected;
        }
        self.format = format;
        Command::Applied
    }

    /// Return to a clean `Idle`: artifact released, queue emptied, error
    /// cleared. The format selection is kept.
    pub fn reset(&mut self) -> Command {
        if self.is_busy() {
            debug!("reset rejected: conversion in progress");
            return Command::Rejected;
        }
        self.artifacts.release();
        self.queue.clear();
        self.error_message.clear();
        self.in_flight = None;
        self.transition(ConversionStatus::Idle);
        Command::Applied
    }

    // ── Conversion ───────────────────────────────────────────────────────

    /// Enter the busy phase and return the request to send.
    ///
    /// Valid from `Idle` or `Error` with a non-empty queue; otherwise returns
    /// `None` and changes nothing. A previous artifact stays downloadable
    /// until a new success replaces it.
    pub fn begin_convert(&mut self) -> Option<ConversionRequest> {
        if !matches!(self.status, ConversionStatus::Idle | ConversionStatus::Error) {
            debug!("convert rejected in state {}", self.status);
            return None;
        }
        if self.queue.is_empty() {
            debug!("convert ignored: queue is empty");
            return None;
        }

        let request = ConversionRequest::new(self.queue.entries().to_vec(), self.format);
        info!(
            "Converting {} files to {}",
            request.files.len(),
            request.format.wire_value()
        );
        self.error_message.clear();
        self.in_flight = Some(request.clone());
        self.transition(ConversionStatus::Uploading);
        Some(request)
    }

    /// Uploading → Processing. Display-only; no-op in any other state.
    pub fn mark_processing(&mut self) {
        if self.status == ConversionStatus::Uploading {
            self.transition(ConversionStatus::Processing);
        }
    }

    /// Resolve the busy phase with the transport's result.
    ///
    /// Rejected unless a request is outstanding.
    pub fn finish(&mut self, result: TransportResult) -> Command {
        if !self.is_busy() {
            warn!("finish called in state {} with no request outstanding", self.status);
            return Command::Rejected;
        }
        let filename = self
            .in_flight
            .as_ref()
            .map(ConversionRequest::suggested_filename)
            .unwrap_or_else(|| format!("document{}", self.format.extension()));

        match interpret(result) {
            Outcome::Success(bytes) => match self.artifacts.publish(&bytes, filename) {
                Ok(handle) => {
                    self.in_flight = None;
                    self.transition(ConversionStatus::Completed);
                    if let Some(ref o) = self.observer {
                        o.on_completed(&handle.filename, handle.size);
                    }
                }
                Err(e) => self.fail(e.to_string()),
            },
            Outcome::Failure(message) => self.fail(message),
        }
        Command::Applied
    }

    /// Run one conversion end to end through the transport.
    ///
    /// Returns `Rejected` without contacting the service when the guard in
    /// [`begin_convert`](Self::begin_convert) refuses.
    pub async fn convert(&mut self) -> Command {
        let Some(request) = self.begin_convert() else {
            return Command::Rejected;
        };
        if let Some(ref o) = self.observer {
            o.on_request_start(request.files.len(), request.total_size());
        }

        // Uploading vs Processing only changes the display text.
        self.mark_processing();
        let result = self.transport.send(&request).await;
        self.finish(result)
    }

    /// Re-issue the failed request with the current queue and format.
    /// Only valid in `Error`.
    pub async fn retry(&mut self) -> Command {
        if self.status != ConversionStatus::Error {
            return Command::Rejected;
        }
        self.convert().await
    }

    // ── Download ─────────────────────────────────────────────────────────

    /// Save the current artifact into `dir`.
    pub async fn download_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, DocLensError> {
        self.artifacts.trigger_download(dir).await
    }

    /// Save the current artifact into the configured download directory.
    pub async fn download(&self) -> Result<PathBuf, DocLensError> {
        self.artifacts.trigger_download(&self.download_dir).await
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn accepts_edits(&self) -> bool {
        matches!(self.status, ConversionStatus::Idle | ConversionStatus::Error)
    }

    fn fail(&mut self, message: String) {
        warn!("Conversion failed: {}", message);
        self.error_message = message;
        self.transition(ConversionStatus::Error);
        if let Some(ref o) = self.observer {
            o.on_failed(&self.error_message);
        }
    }

    fn transition(&mut self, to: ConversionStatus) {
        let from = self.status;
        self.status = to;
        if from != to {
            debug!("Status {} → {}", from, to);
        }
        if let Some(ref o) = self.observer {
            o.on_status_change(from, to);
        }
    }
}

impl<T> fmt::Debug for ConversionController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionController")
            .field("status", &self.status)
            .field("format", &self.format)
            .field("queued", &self.queue.len())
            .field("error_message", &self.error_message)
            .field("artifact", &self.artifacts.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use async_trait::async_trait;

    /// Transport that must never be reached.
    struct Unreachable;

    #[async_trait]
    impl ConversionTransport for Unreachable {
        async fn send(&self, _request: &ConversionRequest) -> TransportResult {
            panic!("transport should not be called");
        }
    }

    fn controller() -> ConversionController<Unreachable> {
        ConversionController::new(Unreachable, &ClientConfig::default())
    }

    fn file(name: &str) -> FileEntry {
        FileEntry::new(name, vec![7u8; 16])
    }

    #[test]
    fn starts_idle_with_word() {
        let c = controller();
        assert_eq!(c.status(), ConversionStatus::Idle);
        assert_eq!(c.format(), OutputFormat::Word);
        assert!(c.error_message().is_empty());
        assert!(c.artifact().is_none());
    }

    #[test]
    fn begin_convert_on_empty_queue_is_ignored() {
        let mut c = controller();
        assert!(c.begin_convert().is_none());
        assert_eq!(c.status(), ConversionStatus::Idle);
    }

    #[tokio::test]
    async fn convert_on_empty_queue_never_calls_transport() {
        let mut c = controller();
        assert_eq!(c.convert().await, Command::Rejected);
        assert_eq!(c.status(), ConversionStatus::Idle);
    }

    #[test]
    fn busy_rejects_every_mutation() {
        let mut c = controller();
        let _ = c.add_files([file("a.png"), file("b.png")]);
        let req = c.begin_convert().unwrap();
        assert_eq!(req.files.len(), 2);
        assert_eq!(c.status(), ConversionStatus::Uploading);
        c.mark_processing();
        assert_eq!(c.status(), ConversionStatus::Processing);

        assert_eq!(c.add_files([file("c.png")]), Command::Rejected);
        assert_eq!(c.remove_file(0).unwrap(), Command::Rejected);
        assert_eq!(c.set_format(OutputFormat::Pdf), Command::Rejected);
        assert_eq!(c.reset(), Command::Rejected);
        assert!(c.begin_convert().is_none());

        assert_eq!(c.status(), ConversionStatus::Processing);
        assert_eq!(c.queue().len(), 2);
        assert_eq!(c.format(), OutputFormat::Word);
    }

    #[test]
    fn success_publishes_artifact() {
        let mut c = controller();
        let _ = c.add_files([file("a.png"), file("b.png")]);
        c.begin_convert().unwrap();
        assert!(c.finish(Ok(Bytes::from_static(b"DOCX"))).is_applied());

        assert_eq!(c.status(), ConversionStatus::Completed);
        let h = c.artifact().unwrap();
        assert_eq!(h.filename, "a_and_1_more.docx");
        assert_eq!(c.artifact_bytes().unwrap(), Bytes::from_static(b"DOCX"));
    }

    #[test]
    fn failure_keeps_queue_and_format() {
        let mut c = controller();
        let _ = c.add_files([file("a.png")]);
        let _ = c.set_format(OutputFormat::PlainText);
        c.begin_convert().unwrap();
        let _ = c.finish(Err(TransportError::http(
            422,
            Some(Bytes::from_static(br#"{"detail":"unsupported file type"}"#)),
        )));

        assert_eq!(c.status(), ConversionStatus::Error);
        assert_eq!(c.error_message(), "unsupported file type");
        assert_eq!(c.queue().len(), 1);
        assert_eq!(c.format(), OutputFormat::PlainText);
    }

    #[test]
    fn retry_clears_error_on_entering_busy() {
        let mut c = controller();
        let _ = c.add_files([file("a.png")]);
        c.begin_convert().unwrap();
        let _ = c.finish(Err(TransportError::network("connection reset")));
        assert_eq!(c.error_message(), "connection reset");

        c.begin_convert().unwrap();
        assert!(c.error_message().is_empty());
        assert_eq!(c.status(), ConversionStatus::Uploading);
    }

    #[test]
    fn finish_outside_busy_is_rejected() {
        let mut c = controller();
        assert_eq!(c.finish(Ok(Bytes::new())), Command::Rejected);
        assert_eq!(c.status(), ConversionStatus::Idle);
    }

    #[test]
    fn stale_artifact_survives_until_next_success() {
        let mut c = controller();
        let _ = c.add_files([file("a.png")]);
        c.begin_convert().unwrap();
        let _ = c.finish(Ok(Bytes::from_static(b"first")));
        // Completed: convert is not valid until reset / add_files.
        assert!(c.begin_convert().is_none());
        assert_eq!(c.artifact_bytes().unwrap(), Bytes::from_static(b"first"));
    }

    #[test]
    fn add_files_from_completed_starts_fresh() {
        let mut c = controller();
        let _ = c.add_files([file("a.png")]);
        c.begin_convert().unwrap();
        let _ = c.finish(Ok(Bytes::from_static(b"first")));
        let old = c.artifact().unwrap().path.clone();

        assert!(c.add_files([file("b.png")]).is_applied());
        assert_eq!(c.status(), ConversionStatus::Idle);
        assert_eq!(c.queue().len(), 1);
        assert_eq!(c.queue().first().unwrap().name(), "b.png");
        assert!(c.artifact().is_none());
        assert!(!old.exists());
    }

    #[test]
    fn reset_from_completed() {
        let mut c = controller();
        let _ = c.add_files([file("a.png")]);
        let _ = c.set_format(OutputFormat::Pdf);
        c.begin_convert().unwrap();
        let _ = c.finish(Ok(Bytes::from_static(b"%PDF")));
        let path = c.artifact().unwrap().path.clone();

        assert!(c.reset().is_applied());
        assert_eq!(c.status(), ConversionStatus::Idle);
        assert!(c.queue().is_empty());
        assert_eq!(c.live_artifacts(), 0);
        assert!(!path.exists());
        assert_eq!(c.format(), OutputFormat::Pdf);
    }

    #[test]
    fn remove_file_bad_index() {
        let mut c = controller();
        let _ = c.add_files([file("a.png")]);
        assert!(matches!(
            c.remove_file(3),
            Err(DocLensError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(c.queue().len(), 1);
    }

    #[test]
    fn status_messages() {
        assert!(ConversionStatus::Uploading.is_busy());
        assert!(ConversionStatus::Processing.is_busy());
        assert!(!ConversionStatus::Error.is_busy());
        assert_eq!(ConversionStatus::Uploading.message(), "Uploading files…");
        assert_eq!(ConversionStatus::Completed.to_string(), "completed");
    }
}
