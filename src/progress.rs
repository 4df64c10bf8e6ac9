//! Progress-callback trait for per-item conversion events.
//!
//! An "item" is one image when packing and one page when rasterising. Inject an
//! [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`].
//!
//! Callbacks fire on the blocking worker thread that performs the conversion.
//! A UI that needs its state touched from one thread should forward the
//! events over a channel, which is what [`crate::job::JobRunner`] does.
//!
//! # Example
//!
//! ```rust
//! use pdfimg::{ConversionConfig, ConversionProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl ConversionProgressCallback for Counter {
//!     fn on_item_complete(&self, index: usize, total: usize, output: &Path) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{index}/{total} → {}", output.display());
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the conversion pipeline as it processes each item.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Indices are 1-based.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the number of items is known, before the first one.
    fn on_conversion_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called before an image is decoded or a page is rendered.
    fn on_item_start(&self, index: usize, total_items: usize) {
        let _ = (index, total_items);
    }

    /// Called after an item is done.
    ///
    /// `path` is the source image when packing and the written PNG when
    /// rasterising.
    fn on_item_complete(&self, index: usize, total_items: usize, path: &Path) {
        let _ = (index, total_items, path);
    }

    /// Called when an item fails. The conversion stops after this.
    fn on_item_error(&self, index: usize, total_items: usize, error: &str) {
        let _ = (index, total_items, error);
    }

    /// Called once after the last item succeeded and output is in place.
    fn on_conversion_complete(&self, total_items: usize) {
        let _ = total_items;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Resolve the configured callback, or a no-op one.
pub(crate) fn callback_or_noop(cb: &Option<ProgressCallback>) -> ProgressCallback {
    cb.clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback) as ProgressCallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        started_total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        finished_total: AtomicUsize,
    }

    impl TrackingCallback {
        fn new() -> Self {
            Self {
                started_total: AtomicUsize::new(0),
                starts: AtomicUsize::new(0),
                completes: AtomicUsize::new(0),
                errors: AtomicUsize::new(0),
                finished_total: AtomicUsize::new(0),
            }
        }
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_conversion_start(&self, total_items: usize) {
            self.started_total.store(total_items, Ordering::SeqCst);
        }

        fn on_item_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_complete(&self, _index: usize, _total: usize, _path: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, total_items: usize) {
            self.finished_total.store(total_items, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_item_start(1, 5);
        cb.on_item_complete(1, 5, Path::new("page_001.png"));
        cb.on_item_error(2, 5, "boom");
        cb.on_conversion_complete(5);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let t = TrackingCallback::new();
        t.on_conversion_start(3);
        t.on_item_start(1, 3);
        t.on_item_complete(1, 3, Path::new("a.png"));
        t.on_item_start(2, 3);
        t.on_item_error(2, 3, "corrupt");

        assert_eq!(t.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(t.starts.load(Ordering::SeqCst), 2);
        assert_eq!(t.completes.load(Ordering::SeqCst), 1);
        assert_eq!(t.errors.load(Ordering::SeqCst), 1);
        assert_eq!(t.finished_total.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn callback_or_noop_keeps_configured() {
        let tracker = Arc::new(TrackingCallback::new());
        let configured: Option<ProgressCallback> = Some(tracker.clone() as ProgressCallback);
        callback_or_noop(&configured).on_conversion_start(9);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 9);

        callback_or_noop(&None).on_conversion_start(1);
    }
}
