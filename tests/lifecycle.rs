//! End-to-end session lifecycle tests against an in-process sink.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use buildmark::{
    BenchmarkSession, DeliveryError, ExitGuard, GuardVerdict, ReportPayload, ReportingSink,
    SessionState, SinkTarget, UsageError,
};
use uuid::Uuid;

/// Sink that records every payload it is handed.
#[derive(Default)]
struct RecordingSink {
    payloads: Mutex<Vec<ReportPayload>>,
}

impl RecordingSink {
    fn delivery_count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    fn last_payload(&self) -> Option<ReportPayload> {
        self.payloads.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ReportingSink for RecordingSink {
    async fn deliver(&self, payload: ReportPayload) -> Result<(), DeliveryError> {
        self.payloads.lock().unwrap().push(payload);
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "recording"
    }
}

fn events_of(payload: &ReportPayload) -> serde_json::Map<String, serde_json::Value> {
    serde_json::from_str(&payload.events).expect("events field should be JSON-encoded")
}

#[tokio::test]
async fn full_lifecycle_delivers_a_well_formed_payload_once() {
    let sink = Arc::new(RecordingSink::default());
    let session = BenchmarkSession::with_sink(sink.clone());

    session.mark_start().unwrap();
    std::thread::sleep(Duration::from_millis(2));
    session.mark_data_point("pre-build").unwrap();
    std::thread::sleep(Duration::from_millis(2));
    let handle = session.mark_stop().unwrap();
    handle.await.unwrap();

    assert_eq!(session.state(), SessionState::Flushed);
    assert_eq!(sink.delivery_count(), 1);

    let payload = sink.last_payload().unwrap();
    assert_eq!(payload.time, session.local_time());
    chrono::DateTime::parse_from_rfc3339(&payload.time).expect("time should be ISO-8601");
    let id = Uuid::parse_str(&payload.session_id).expect("sessionId should be a UUID");
    assert_eq!(id.get_version_num(), 4);

    let events = events_of(&payload);
    let millis = |key: &str| events[key].as_f64().unwrap();
    assert!(millis("bootstrapTime") <= millis("instanceTime"));
    assert!(millis("instanceTime") <= millis("start"));
    assert!(millis("start") < millis("pre-build"));
    assert!(millis("pre-build") < millis("stop"));
}

#[tokio::test]
async fn guard_racing_the_stop_flush_awaits_the_same_attempt() {
    let sink = Arc::new(RecordingSink::default());
    let session = BenchmarkSession::with_sink(sink.clone());

    session.mark_start().unwrap();
    let handle = session.mark_stop().unwrap();

    // Termination arrives while the flush is in flight. The guard must
    // settle the existing attempt and force a failure exit code without
    // starting a second delivery.
    let guard = ExitGuard::new(session.clone());
    let verdict = guard.reconcile().await;
    assert_eq!(verdict, GuardVerdict::ForcedFailure);
    assert_eq!(verdict.exit_code(), Some(1));

    handle.await.unwrap();
    assert_eq!(sink.delivery_count(), 1);
}

#[tokio::test]
async fn abandoned_session_is_flushed_by_the_guard() {
    let sink = Arc::new(RecordingSink::default());
    let session = BenchmarkSession::with_sink(sink.clone());
    session.mark_start().unwrap();

    let guard = ExitGuard::new(session.clone());
    let verdict = guard.reconcile().await;
    assert_eq!(verdict, GuardVerdict::ForcedFailure);
    assert_eq!(sink.delivery_count(), 1);

    let events = events_of(&sink.last_payload().unwrap());
    assert!(events.contains_key("post-build"));
    assert!(events["stop"].as_f64().unwrap() >= events["start"].as_f64().unwrap());
}

#[tokio::test]
async fn clean_shutdown_keeps_the_host_exit_code() {
    let sink = Arc::new(RecordingSink::default());
    let session = BenchmarkSession::with_sink(sink.clone());
    session.mark_start().unwrap();
    session.mark_stop().unwrap().await.unwrap();

    let verdict = ExitGuard::new(session).reconcile().await;
    assert_eq!(verdict, GuardVerdict::Clean);
    assert_eq!(verdict.exit_code(), None);
    assert_eq!(sink.delivery_count(), 1);
}

#[test]
fn sequencing_violations_carry_exit_code_one() {
    let sink = Arc::new(RecordingSink::default());
    let session = BenchmarkSession::with_sink(sink);

    let err = session.mark_stop().unwrap_err();
    assert_eq!(err, UsageError::StopBeforeStart);
    assert_eq!(err.exit_code(), 1);

    session.mark_start().unwrap();
    let err = session.mark_start().unwrap_err();
    assert_eq!(err, UsageError::DoubleStart);
    assert_eq!(buildmark::report_usage_error(err), 1);
}

#[tokio::test]
async fn local_target_flushes_without_a_network() {
    let session = BenchmarkSession::new(&SinkTarget::Local).unwrap();
    session.mark_start().unwrap();
    session.mark_data_point("pre-build").unwrap();
    session.mark_stop().unwrap().await.unwrap();

    assert_eq!(session.state(), SessionState::Flushed);
    assert_eq!(ExitGuard::new(session).reconcile().await, GuardVerdict::Clean);
}

#[test]
fn endpoint_setting_selects_the_sink() {
    assert_eq!(SinkTarget::from_endpoint_setting(None), SinkTarget::Local);
    assert_eq!(SinkTarget::from_endpoint_setting(Some("")), SinkTarget::Local);
    assert_eq!(
        SinkTarget::from_endpoint_setting(Some("cli")),
        SinkTarget::Local
    );
    assert_eq!(
        SinkTarget::from_endpoint_setting(Some("http://example.test/report")),
        SinkTarget::Remote {
            endpoint: "http://example.test/report".to_string()
        }
    );
}
