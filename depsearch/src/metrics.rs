use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// Counters shared by the walker and every matcher thread of one scan
#[derive(Debug, Default)]
pub struct ScanMetrics {
    candidates: AtomicU64,
    matched: AtomicU64,
    oversized: AtomicU64,
    unreadable: AtomicU64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a Makefile queued by the walker
    pub fn record_candidate(&self) {
        self.candidates.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a Makefile that produced a result
    pub fn record_match(&self) {
        self.matched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a Makefile skipped by the size guard
    pub fn record_oversized(&self) {
        self.oversized.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a Makefile that could not be stat'ed or opened
    pub fn record_unreadable(&self) {
        self.unreadable.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot of the counters
    pub fn snapshot(&self, elapsed: Duration) -> ScanStats {
        ScanStats {
            candidates: self.candidates.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            oversized: self.oversized.load(Ordering::Relaxed),
            unreadable: self.unreadable.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

/// Summary of a finished scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub candidates: u64,
    pub matched: u64,
    pub oversized: u64,
    pub unreadable: u64,
    pub elapsed: Duration,
}

impl ScanStats {
    /// Logs the summary at info level
    pub fn log(&self) {
        let elapsed = Duration::from_millis(self.elapsed.as_millis() as u64);
        info!(
            "Scan finished in {}: {} Makefiles examined, {} matched, {} oversized, {} unreadable",
            humantime::format_duration(elapsed),
            self.candidates,
            self.matched,
            self.oversized,
            self.unreadable
        );
    }
}
