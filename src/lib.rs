//! Buildmark: Build Lifecycle Timing Reporter
//!
//! Captures a timeline of named monotonic timestamps across one build
//! lifecycle and delivers it, at most once, to a reporting sink (remote
//! HTTP endpoint or the local log) before the process exits.

pub mod clock;
pub mod config;
pub mod error;
pub mod flush;
pub mod guard;
pub mod logging;
pub mod session;
pub mod sink;
pub mod timeline;

pub use config::{ReportingConfig, SinkTarget};
pub use error::{ConfigError, DeliveryError, UsageError};
pub use guard::{ExitGuard, GuardVerdict};
pub use session::{report_usage_error, BenchmarkSession, SessionState};
pub use sink::{LocalSink, RemoteSink, ReportPayload, ReportingSink};
pub use timeline::EventTimeline;
