use std::sync::atomic::{AtomicU64, Ordering};

/// Progress tracker for a running scan.
///
/// The scanner bumps the counter once per filesystem object it visits;
/// observers read it from another thread. Results never depend on it.
#[derive(Debug, Default)]
pub struct ScanProgress {
    visited: AtomicU64,
}

impl ScanProgress {
    /// Create a new progress tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one visited object.
    pub fn increment(&self) {
        self.visited.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of objects visited so far.
    pub fn visited(&self) -> u64 {
        self.visited.load(Ordering::Relaxed)
    }
}
