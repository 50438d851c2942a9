//! Flush coordination: the at-most-one delivery guarantee.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{error, info};

use crate::error::DeliveryError;
use crate::sink::{ReportPayload, ReportingSink};

/// Handle to the one delivery attempt. Cloneable; every clone awaits the
/// same underlying attempt and observes the same outcome.
///
/// The handle is lazy: delivery makes progress only while some caller is
/// awaiting it. The normal path awaits the handle returned by
/// `mark_stop`; the exit guard awaits the same handle when it has to
/// intervene. Either way there is exactly one attempt.
pub type FlushHandle = Shared<BoxFuture<'static, Result<(), DeliveryError>>>;

/// Owns the at-most-one-flush guarantee: memoizes the delivery future and
/// tracks whether it has settled.
pub struct FlushCoordinator {
    sink: Arc<dyn ReportingSink>,
    pending: Mutex<Option<FlushHandle>>,
    completed: Arc<AtomicBool>,
}

impl FlushCoordinator {
    pub fn new(sink: Arc<dyn ReportingSink>) -> Self {
        Self {
            sink,
            pending: Mutex::new(None),
            completed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a delivery attempt has been started.
    pub fn started(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Whether the delivery attempt has settled, successfully or not.
    pub fn completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// The existing delivery handle, if flush has been invoked.
    pub fn handle(&self) -> Option<FlushHandle> {
        self.pending.lock().clone()
    }

    /// Start delivering `payload`, or return the already-started attempt
    /// unchanged. Idempotent: the payload of a second call is dropped.
    ///
    /// The settle notice and the completion flag are part of the one
    /// shared future, so they fire exactly once no matter how many
    /// callers await the handle.
    pub fn flush(&self, payload: ReportPayload) -> FlushHandle {
        let mut pending = self.pending.lock();
        if let Some(handle) = pending.as_ref() {
            return handle.clone();
        }

        info!(sink = self.sink.sink_name(), "flushing benchmark data");

        let sink = Arc::clone(&self.sink);
        let completed = Arc::clone(&self.completed);
        let handle = async move {
            let result = sink.deliver(payload).await;
            completed.store(true, Ordering::Release);
            match &result {
                Ok(()) => info!(sink = sink.sink_name(), "benchmark data flushed"),
                Err(err) => {
                    error!(sink = sink.sink_name(), error = %err, "benchmark delivery failed")
                }
            }
            result
        }
        .boxed()
        .shared();

        *pending = Some(handle.clone());
        handle
    }
}
