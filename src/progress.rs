//! Progress reporting for the ward fan-out.
//!
//! Keeps the comparison engine independent of how progress is rendered.
//! The binary plugs in an `indicatif` bar; tests and library callers use
//! [`NullProgress`].

/// Receives progress updates from long-running operations.
pub trait ProgressCallback: Send + Sync {
    /// Total units of work, once known.
    fn set_total(&self, total: u64);

    /// Advance by `delta` units.
    fn inc(&self, delta: u64);

    /// Mark the work as finished.
    fn finish(&self);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn finish(&self) {}
}

impl ProgressCallback for indicatif::ProgressBar {
    fn set_total(&self, total: u64) {
        self.set_length(total);
    }

    fn inc(&self, delta: u64) {
        indicatif::ProgressBar::inc(self, delta);
    }

    fn finish(&self) {
        self.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_callback() {
        let bar = indicatif::ProgressBar::hidden();
        let progress: &dyn ProgressCallback = &bar;
        progress.set_total(3);
        progress.inc(2);
        assert_eq!(bar.length(), Some(3));
        assert_eq!(bar.position(), 2);
    }
}
