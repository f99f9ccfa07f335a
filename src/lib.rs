//! # doclens-client
//!
//! Client for the DocLens conversion service: turn photos, scans and PDFs
//! into a Word, PDF or plain-text document.
//!
//! The service does the hard part (OCR, structure recovery, document
//! generation). This crate does the orchestration around it: a queue of
//! input files, one conversion request at a time, interpretation of an
//! answer whose success and failure bodies share one binary channel, and the
//! lifecycle of the downloadable result.
//!
//! ## Components
//!
//! ```text
//! FileQueue ─┐
//!            ├─▶ ConversionController ──▶ ConversionTransport ──▶ interpret ──▶ ArtifactManager
//! OutputFormat┘       (state machine)        (HTTP multipart)     (Outcome)     (temp-file handle)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doclens_client::{ClientConfig, ConversionController, ConversionStatus, FileEntry, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base URL from DOCLENS_API_URL, else http://localhost:8000
//!     let config = ClientConfig::from_env()?;
//!     let mut controller = ConversionController::from_config(&config)?;
//!
//!     let _ = controller.add_files([FileEntry::from_path("receipt.jpg").await?]);
//!     let _ = controller.set_format(OutputFormat::Pdf);
//!     let _ = controller.convert().await;
//!
//!     match controller.status() {
//!         ConversionStatus::Completed => {
//!             let saved = controller.download().await?;
//!             println!("saved {}", saved.display());
//!         }
//!         _ => eprintln!("failed: {}", controller.error_message()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doclens` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod config;
pub mod controller;
pub mod error;
pub mod interpret;
pub mod progress;
pub mod queue;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{ArtifactHandle, ArtifactManager};
pub use config::{ClientConfig, ClientConfigBuilder, OutputFormat};
pub use controller::{Command, ConversionController, ConversionStatus};
pub use error::DocLensError;
pub use interpret::{interpret, Outcome, GENERIC_FAILURE};
pub use progress::{ConversionObserver, NoopObserver, Observer};
pub use queue::{FileEntry, FileQueue};
pub use transport::{
    ConversionRequest, ConversionTransport, HttpTransport, TransportError, TransportResult,
};
