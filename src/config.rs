//! Reporting configuration: where a finished timeline is delivered.
//!
//! A single environment-style setting selects the sink. Unset or empty
//! means the local log; the literal `cli` sentinel also means the local
//! log (explicit CLI-output mode); any other non-empty value is taken as
//! the remote HTTP endpoint URL.

use serde::{Deserialize, Serialize};

/// Environment variable naming the reporting endpoint.
pub const REPORTING_URL_ENV: &str = "BUILDMARK_REPORTING_URL";

/// Sentinel endpoint value that explicitly selects CLI output.
pub const CLI_SENTINEL: &str = "cli";

/// Delivery target for a flushed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkTarget {
    /// Dump the payload to the informational log channel.
    Local,
    /// POST the payload to this endpoint.
    Remote { endpoint: String },
}

impl Default for SinkTarget {
    fn default() -> Self {
        SinkTarget::Local
    }
}

impl SinkTarget {
    /// Resolve a target from an endpoint setting as found in the
    /// environment or a host config file.
    pub fn from_endpoint_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(CLI_SENTINEL) => SinkTarget::Local,
            Some(endpoint) => SinkTarget::Remote {
                endpoint: endpoint.to_string(),
            },
        }
    }

    /// Resolve from [`REPORTING_URL_ENV`].
    pub fn from_env() -> Self {
        Self::from_endpoint_setting(std::env::var(REPORTING_URL_ENV).ok().as_deref())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SinkTarget::Remote { .. })
    }
}

/// Reporting configuration, embeddable in a host's own config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportingConfig {
    #[serde(default)]
    pub sink: SinkTarget,
}

impl ReportingConfig {
    /// Build a config from the environment alone.
    pub fn from_env() -> Self {
        Self {
            sink: SinkTarget::from_env(),
        }
    }
}
