//! Shared timing helpers: the process-wide monotonic clock.
//!
//! All timeline values are milliseconds relative to one monotonic epoch,
//! anchored the first time the clock is read. Wall-clock time never leaks
//! into the timeline; it appears only in the payload's `time` field.

use std::sync::OnceLock;
use std::time::Instant;

static PROCESS_EPOCH: OnceLock<Instant> = OnceLock::new();
static BOOTSTRAP_MILLIS: OnceLock<f64> = OnceLock::new();

/// Milliseconds elapsed since the process epoch.
pub fn monotonic_millis() -> f64 {
    let epoch = PROCESS_EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_secs_f64() * 1000.0
}

/// Record the bootstrap instant and return it.
///
/// Hosts call this as early as possible, before any build work. The first
/// call fixes the reading; later calls return the same value, and a session
/// constructed without a prior call falls back to its own construction
/// instant, so `bootstrapTime <= instanceTime` always holds.
pub fn mark_bootstrap() -> f64 {
    *BOOTSTRAP_MILLIS.get_or_init(monotonic_millis)
}
