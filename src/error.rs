//! Error types for the buildmark reporting pipeline.

use thiserror::Error;

/// Caller-sequencing violations. These are programmer errors with no
/// recovery path: hosts log them on the error channel and terminate with
/// [`UsageError::exit_code`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    #[error("mark_start() called more than once")]
    DoubleStart,

    #[error("mark_stop() called before mark_start()")]
    StopBeforeStart,

    #[error("mark_stop() called after flush was already started")]
    DoubleStop,

    #[error("mark_data_point() called before mark_start()")]
    MarkBeforeStart,

    #[error("mark_data_point() called after flush was started")]
    MarkAfterFlush,
}

impl UsageError {
    /// Exit code a host must terminate with after observing this error.
    pub fn exit_code(self) -> i32 {
        1
    }
}

/// Failures while transmitting a flushed timeline to a remote sink.
///
/// Never retried; non-fatal to the build itself. Cloneable so the one
/// memoized flush future can hand the same outcome to every awaiter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("endpoint {url} responded with status {status}")]
    ErrorStatus { url: String, status: u16 },

    #[error("failed to read response body from {url}: {reason}")]
    BodyRead { url: String, reason: String },
}

/// Setup problems in the reporting stack itself. An absent or sentinel
/// endpoint is not an error; it selects the local sink deterministically.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("invalid log directive: {0}")]
    InvalidLogDirective(String),

    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}
