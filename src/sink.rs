//! Reporting sinks: delivery targets for a flushed session timeline.
//!
//! A sink is selected once, at session construction, from the reporting
//! configuration. Remote delivery is strictly single-shot: any network
//! failure or non-success response surfaces as a [`DeliveryError`] and is
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SinkTarget;
use crate::error::{ConfigError, DeliveryError};

/// Wire payload POSTed to a remote endpoint or dumped to the log.
///
/// `events` is itself a JSON-encoded object mapping event name to
/// millisecond timestamp, carried as a string field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPayload {
    pub time: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub events: String,
}

/// A delivery target for a finished timeline.
#[async_trait]
pub trait ReportingSink: Send + Sync {
    /// Deliver the payload. Completion means the sink has fully finished
    /// with it; for HTTP that includes reading the response body.
    async fn deliver(&self, payload: ReportPayload) -> Result<(), DeliveryError>;

    /// Short sink name for log lines.
    fn sink_name(&self) -> &str;
}

const SINK_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
// Also bounds how long an exit guard can hang on an unresponsive endpoint.
const SINK_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn build_sink_http_client() -> Result<Client, ConfigError> {
    Client::builder()
        .no_proxy()
        .connect_timeout(SINK_HTTP_CONNECT_TIMEOUT)
        .timeout(SINK_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Sink that POSTs the payload to a configured HTTP endpoint.
pub struct RemoteSink {
    client: Client,
    endpoint: String,
}

impl RemoteSink {
    pub fn new(endpoint: String) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_sink_http_client()?,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReportingSink for RemoteSink {
    async fn deliver(&self, payload: ReportPayload) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::RequestFailed {
                url: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::ErrorStatus {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        // Delivery only counts once the response body has been fully read.
        let body = response.text().await.map_err(|e| DeliveryError::BodyRead {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        info!(endpoint = %self.endpoint, response = %body, "server acknowledged benchmark report");
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "remote"
    }
}

/// Sink that dumps the payload to the informational log channel.
/// Resolves immediately and never fails.
pub struct LocalSink;

#[async_trait]
impl ReportingSink for LocalSink {
    async fn deliver(&self, payload: ReportPayload) -> Result<(), DeliveryError> {
        info!(
            time = %payload.time,
            session_id = %payload.session_id,
            events = %payload.events,
            "benchmarking data"
        );
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "local"
    }
}

/// Build the sink for a configured target.
pub fn sink_for_target(target: &SinkTarget) -> Result<Arc<dyn ReportingSink>, ConfigError> {
    match target {
        SinkTarget::Local => Ok(Arc::new(LocalSink)),
        SinkTarget::Remote { endpoint } => Ok(Arc::new(RemoteSink::new(endpoint.clone())?)),
    }
}

// Mock sink for testing the coordinator and guard without a network.
#[cfg(test)]
pub(crate) struct MockSink {
    deliveries: std::sync::Mutex<Vec<ReportPayload>>,
    fail_with: Option<DeliveryError>,
}

#[cfg(test)]
impl MockSink {
    pub(crate) fn new() -> Self {
        Self {
            deliveries: std::sync::Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    pub(crate) fn failing(err: DeliveryError) -> Self {
        Self {
            deliveries: std::sync::Mutex::new(Vec::new()),
            fail_with: Some(err),
        }
    }

    pub(crate) fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    pub(crate) fn last_payload(&self) -> Option<ReportPayload> {
        self.deliveries.lock().unwrap().last().cloned()
    }
}

#[cfg(test)]
#[async_trait]
impl ReportingSink for MockSink {
    async fn deliver(&self, payload: ReportPayload) -> Result<(), DeliveryError> {
        self.deliveries.lock().unwrap().push(payload);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn sink_name(&self) -> &str {
        "mock"
    }
}
