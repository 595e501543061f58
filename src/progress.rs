//! Progress-callback trait for per-slide generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through a job.
//!
//! Callbacks fit any host: forward events to a channel, a websocket, a status
//! table, or a terminal progress bar. The trait is `Send + Sync` because
//! several jobs run on different pool workers at once.
//!
//! # Example
//!
//! ```rust
//! use aislide::{GenerationProgressCallback, GenerationConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     slides: AtomicUsize,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_slide_complete(&self, index: usize, total: usize, _has_image: bool) {
//!         self.slides.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("slide {}/{} done", index + 1, total);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { slides: AtomicUsize::new(0) });
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator while it generates a job.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Slide indices are 0-based.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once the slide plan is known.
    fn on_job_start(&self, job_id: &str, total_slides: usize) {
        let _ = (job_id, total_slides);
    }

    /// Called before content generation for a slide begins.
    fn on_slide_start(&self, index: usize, total: usize, title: &str) {
        let _ = (index, total, title);
    }

    /// Called once the slide's fragment is built.
    fn on_slide_complete(&self, index: usize, total: usize, has_image: bool) {
        let _ = (index, total, has_image);
    }

    /// Called after the job is marked `Completed`.
    fn on_job_complete(&self, job_id: &str, artifact: &str) {
        let _ = (job_id, artifact);
    }

    /// Called after the job is marked `Failed`.
    fn on_job_failed(&self, job_id: &str, error: &str) {
        let _ = (job_id, error);
    }
}

/// A no-op implementation, the default when no callback is configured.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        slides: AtomicUsize,
        images: AtomicUsize,
        failures: AtomicUsize,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_job_start(&self, _job_id: &str, total_slides: usize) {
            self.started_total.store(total_slides, Ordering::SeqCst);
        }

        fn on_slide_complete(&self, _index: usize, _total: usize, has_image: bool) {
            self.slides.fetch_add(1, Ordering::SeqCst);
            if has_image {
                self.images.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_job_failed(&self, _job_id: &str, _error: &str) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_job_start("job", 5);
        cb.on_slide_start(1, 5, "Intro");
        cb.on_slide_complete(1, 5, false);
        cb.on_job_complete("job", "/api/slides/download/job.pdf");
        cb.on_job_failed("job", "boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_job_start("job", 3);
        tracker.on_slide_complete(1, 3, false);
        tracker.on_slide_complete(2, 3, true);
        tracker.on_slide_complete(3, 3, false);
        tracker.on_job_failed("job", "render failed");

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.slides.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.images.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.failures.load(Ordering::SeqCst), 1);
    }
}
