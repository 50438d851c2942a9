//! Benchmark session: the unit of one measured build lifecycle.
//!
//! A session is constructed once at process start and shared by reference
//! between the host's lifecycle hooks and the exit guard; there is no
//! ambient global. Both parties run on one logical thread, so the lock
//! only makes the sharing explicit, it is never contended across threads.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::clock;
use crate::config::SinkTarget;
use crate::error::{ConfigError, UsageError};
use crate::flush::{FlushCoordinator, FlushHandle};
use crate::sink::{sink_for_target, ReportPayload, ReportingSink};
use crate::timeline::EventTimeline;

/// Canonical data point names recorded by host lifecycle hooks.
pub const PRE_INIT: &str = "pre-init";
pub const PRE_BOOTSTRAP: &str = "pre-bootstrap";
pub const PRE_BUILD: &str = "pre-build";
pub const POST_BUILD: &str = "post-build";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Started,
    Flushing,
    Flushed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Started => "started",
            SessionState::Flushing => "flushing",
            SessionState::Flushed => "flushed",
        }
    }
}

struct SessionInner {
    state: SessionState,
    timeline: EventTimeline,
}

/// Composes a timeline and a flush coordinator behind the start/mark/stop
/// lifecycle. Lives for the whole process; the exit guard inspects it one
/// last time at termination.
pub struct BenchmarkSession {
    local_time: String,
    inner: Mutex<SessionInner>,
    coordinator: FlushCoordinator,
}

impl BenchmarkSession {
    /// Construct a session delivering to the configured target.
    pub fn new(target: &SinkTarget) -> Result<Arc<Self>, ConfigError> {
        match target {
            SinkTarget::Local => info!("will report benchmark data to the CLI"),
            SinkTarget::Remote { endpoint } => {
                info!(endpoint = %endpoint, "will report benchmark data to remote endpoint")
            }
        }
        Ok(Self::with_sink(sink_for_target(target)?))
    }

    /// Construct a session around an explicit sink. Seam for hosts with
    /// custom delivery targets and for tests.
    pub fn with_sink(sink: Arc<dyn ReportingSink>) -> Arc<Self> {
        Arc::new(Self {
            local_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                timeline: EventTimeline::new(),
            }),
            coordinator: FlushCoordinator::new(sink),
        })
    }

    /// Wall-clock ISO-8601 timestamp fixed at construction.
    pub fn local_time(&self) -> &str {
        &self.local_time
    }

    /// Current lifecycle state. `Flushing` becomes `Flushed` once the
    /// delivery attempt settles.
    pub fn state(&self) -> SessionState {
        let stored = self.inner.lock().state;
        if stored == SessionState::Flushing && self.coordinator.completed() {
            return SessionState::Flushed;
        }
        stored
    }

    /// Mark the start of the measured interval. At most once per session.
    pub fn mark_start(&self) -> Result<(), UsageError> {
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Idle {
            return Err(UsageError::DoubleStart);
        }
        inner.timeline.set_start(clock::monotonic_millis());
        inner.state = SessionState::Started;
        Ok(())
    }

    /// Record a named data point. Only valid between `mark_start` and
    /// `mark_stop`; the flush snapshot is taken at `mark_stop`, so later
    /// marks could never ship and are rejected.
    pub fn mark_data_point(&self, name: &str) -> Result<(), UsageError> {
        let mut inner = self.inner.lock();
        match inner.state {
            SessionState::Idle => Err(UsageError::MarkBeforeStart),
            SessionState::Started => {
                inner.timeline.insert(name, clock::monotonic_millis());
                Ok(())
            }
            SessionState::Flushing | SessionState::Flushed => Err(UsageError::MarkAfterFlush),
        }
    }

    /// Mark the end of the measured interval and start the flush.
    ///
    /// Snapshots the timeline, hands it to the coordinator, and returns
    /// the delivery handle. The synchronous part never suspends; await
    /// the returned handle to drive delivery.
    pub fn mark_stop(&self) -> Result<FlushHandle, UsageError> {
        let mut inner = self.inner.lock();
        match inner.state {
            SessionState::Idle => Err(UsageError::StopBeforeStart),
            SessionState::Flushing | SessionState::Flushed => Err(UsageError::DoubleStop),
            SessionState::Started => {
                inner.timeline.set_stop(clock::monotonic_millis());
                inner.state = SessionState::Flushing;
                let payload = self.capture_payload(&inner);
                Ok(self.coordinator.flush(payload))
            }
        }
    }

    /// Whether a flush has been started.
    pub fn flush_started(&self) -> bool {
        self.coordinator.started()
    }

    /// Whether the flush has settled, successfully or not.
    pub fn flush_completed(&self) -> bool {
        self.coordinator.completed()
    }

    /// The delivery handle, if a flush has been started.
    pub fn flush_handle(&self) -> Option<FlushHandle> {
        self.coordinator.handle()
    }

    // Serializes the timeline into the wire payload. A fresh session id
    // is generated per call; flush serializes exactly once per session,
    // so the id is stable for everything that ships.
    fn capture_payload(&self, inner: &SessionInner) -> ReportPayload {
        ReportPayload {
            time: self.local_time.clone(),
            session_id: Uuid::new_v4().to_string(),
            events: Value::Object(inner.timeline.to_event_map()).to_string(),
        }
    }
}

/// Log a usage error on the error channel and hand back the exit code the
/// host must terminate with. Sequencing violations have no recovery path.
pub fn report_usage_error(err: UsageError) -> i32 {
    error!(error = %err, "benchmark session misuse, terminating");
    err.exit_code()
}
