//! Observer trait for controller status changes.
//!
//! Inject an [`Arc<dyn ConversionObserver>`] via
//! [`crate::controller::ConversionController::with_observer`] to receive an
//! event every time the controller moves between states.
//!
//! # Example
//!
//! ```rust
//! use doclens_client::{ConversionObserver, ConversionStatus};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder {
//!     seen: Mutex<Vec<ConversionStatus>>,
//! }
//!
//! impl ConversionObserver for Recorder {
//!     fn on_status_change(&self, _from: ConversionStatus, to: ConversionStatus) {
//!         self.seen.lock().unwrap().push(to);
//!     }
//! }
//!
//! let recorder: Arc<dyn ConversionObserver> = Arc::new(Recorder::default());
//! recorder.on_status_change(ConversionStatus::Idle, ConversionStatus::Uploading);
//! ```

use crate::controller::ConversionStatus;
use std::sync::Arc;

/// Called by the controller as a conversion progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionObserver: Send + Sync {
    /// Called after every state transition, including self-transitions that
    /// clear an error.
    fn on_status_change(&self, from: ConversionStatus, to: ConversionStatus) {
        let _ = (from, to);
    }

    /// Called just before the request is handed to the transport.
    ///
    /// # Arguments
    /// * `file_count`: number of files in the upload
    /// * `total_bytes`: combined size of the upload
    fn on_request_start(&self, file_count: usize, total_bytes: u64) {
        let _ = (file_count, total_bytes);
    }

    /// Called when a conversion ends in `Completed`.
    fn on_completed(&self, filename: &str, size: u64) {
        let _ = (filename, size);
    }

    /// Called when a conversion ends in `Error`.
    fn on_failed(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}

/// Convenience alias matching the type stored in the controller.
pub type Observer = Arc<dyn ConversionObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingObserver {
        transitions: AtomicUsize,
        failures: AtomicUsize,
    }

    impl ConversionObserver for CountingObserver {
        fn on_status_change(&self, _from: ConversionStatus, _to: ConversionStatus) {
            self.transitions.fetch_add(1, Ordering::SeqCst);
        }

        fn on_failed(&self, _message: &str) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_status_change(ConversionStatus::Idle, ConversionStatus::Uploading);
        o.on_request_start(2, 1024);
        o.on_completed("a.docx", 10);
        o.on_failed("boom");
    }

    #[test]
    fn counting_observer_receives_events() {
        let o = CountingObserver {
            transitions: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        };
        o.on_status_change(ConversionStatus::Idle, ConversionStatus::Uploading);
        o.on_status_change(ConversionStatus::Uploading, ConversionStatus::Processing);
        o.on_status_change(ConversionStatus::Processing, ConversionStatus::Error);
        o.on_failed("unsupported file type");
        // Default no-op method still callable.
        o.on_completed("x.pdf", 1);

        assert_eq!(o.transitions.load(Ordering::SeqCst), 3);
        assert_eq!(o.failures.load(Ordering::SeqCst), 1);
    }
}
