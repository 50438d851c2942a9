//! Exit guard: termination-time reconciliation of session state.
//!
//! The guard is best-effort by construction. On runtimes whose
//! process-termination hook is synchronous, asynchronous work started
//! inside the hook is not guaranteed to finish before the process dies;
//! nothing here can paper over that. Hosts with an async-aware shutdown
//! phase should await [`ExitGuard::reconcile`] there, which makes the
//! "flush never started" branch reachable only when the host forgot to
//! call `mark_stop`.

use std::sync::Arc;

use tracing::{error, warn};

use crate::session::{BenchmarkSession, POST_BUILD};

/// Outcome of the guard's reconciliation at process termination.
///
/// If the guard had to intervene, normal shutdown sequencing did not
/// occur as intended; the process signals that with a non-zero exit code
/// regardless of whether delivery itself succeeded, so a delivery racing
/// the exit is observable to operators instead of silently swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Flush completed before shutdown; keep the host's own exit code.
    Clean,
    /// The guard had to intervene; the process must exit non-zero.
    ForcedFailure,
}

impl GuardVerdict {
    /// Exit code override, or `None` to keep the host's own code.
    pub fn exit_code(self) -> Option<i32> {
        match self {
            GuardVerdict::Clean => None,
            GuardVerdict::ForcedFailure => Some(1),
        }
    }
}

/// Process-wide teardown observer. Registered once, against an explicit
/// session reference rather than ambient state.
pub struct ExitGuard {
    session: Arc<BenchmarkSession>,
}

impl ExitGuard {
    pub fn new(session: Arc<BenchmarkSession>) -> Self {
        Self { session }
    }

    /// Inspect the session at the termination instant and force delivery
    /// if it has not completed normally.
    ///
    /// Never starts a second delivery: whatever branch runs, the one
    /// memoized flush handle is awaited.
    pub async fn reconcile(&self) -> GuardVerdict {
        if let Some(handle) = self.session.flush_handle() {
            if self.session.flush_completed() {
                return GuardVerdict::Clean;
            }
            // In flight: wait for the existing attempt to settle. Its
            // outcome is already logged by the flush continuation.
            let _ = handle.await;
            return GuardVerdict::ForcedFailure;
        }

        warn!("benchmark flush never started before shutdown; flushing now, probably too late");
        if let Err(err) = self.session.mark_data_point(POST_BUILD) {
            error!(error = %err, "could not record final data point");
        }
        match self.session.mark_stop() {
            Ok(handle) => {
                let _ = handle.await;
            }
            Err(err) => error!(error = %err, "could not flush benchmark data at shutdown"),
        }
        GuardVerdict::ForcedFailure
    }
}
