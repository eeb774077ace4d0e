use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::{info, trace, warn};

use super::matcher::MakefileMatcher;
use super::walker::walk_makefiles;
use crate::config::ScanConfig;
use crate::errors::ScanResult;
use crate::metrics::ScanMetrics;
use crate::results::{ScanMatch, ScanOutcome};
use crate::terms::TermSet;

/// Queue slots per worker between the walker and the matchers
const QUEUE_DEPTH_PER_WORKER: usize = 2;

/// Scans the configured tree for Makefiles matching any of `terms`.
///
/// The walker runs on the calling thread and feeds a bounded queue drained
/// by exactly `workers` matcher threads. When the walk ends, successfully or
/// not, the queue is closed, the matchers finish what is already queued, and
/// the collected matches are returned together with any traversal error.
///
/// Only a failure to start the worker pool is returned as `Err`.
pub fn scan(config: &ScanConfig, terms: &TermSet) -> ScanResult<ScanOutcome> {
    let config = config.normalized();
    let workers = config.workers;
    info!(
        "Scanning {} with {} terms on {} workers",
        config.root_path.display(),
        terms.len(),
        workers
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("depsearch-matcher-{index}"))
        .build()?;

    let start = Instant::now();
    let metrics = ScanMetrics::new();
    let results: Mutex<Vec<ScanMatch>> = Mutex::new(Vec::new());
    let matcher = MakefileMatcher::new(&config, terms, &metrics);
    let (sender, receiver) = crossbeam_channel::bounded::<PathBuf>(workers * QUEUE_DEPTH_PER_WORKER);

    let walked = pool.in_place_scope(|scope| {
        for _ in 0..workers {
            let receiver = receiver.clone();
            let matcher = &matcher;
            let results = &results;
            scope.spawn(move |_| {
                for path in receiver.iter() {
                    if let Some(found) = matcher.match_file(&path) {
                        results
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(found);
                    }
                }
            });
        }
        drop(receiver);

        let walked = walk_makefiles(&config.root_path, &config.skip_dirs, |path| {
            trace!("Queueing {}", path.display());
            metrics.record_candidate();
            // Fails only once every matcher is gone, which cannot happen while
            // the scope is alive.
            let _ = sender.send(path);
        });
        // Closing the queue lets the matchers drain and exit.
        drop(sender);
        walked
    });

    let matches = results
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    let stats = metrics.snapshot(start.elapsed());
    stats.log();

    let error = walked.err();
    if let Some(err) = &error {
        warn!("Traversal stopped early: {}", err);
    }

    Ok(ScanOutcome {
        matches,
        error,
        stats,
    })
}
