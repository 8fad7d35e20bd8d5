//! Fire-and-forget submission to the durable log sink.
//!
//! Contract: best-effort, log-on-failure. A failed write is warned about
//! and dropped; it is never retried, never propagated, and never turns a
//! successfully executed action into a failure. Nothing on the main
//! execution path awaits these tasks.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::warn;

use waypoint_core::audit::{AuditRecord, RecordSink, TelemetryRecord};

#[derive(Clone)]
pub struct Recorder {
    sink: Arc<dyn RecordSink>,
}

impl Recorder {
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self { sink }
    }

    /// Submit an audit record in the background. The returned handle is
    /// for tests; production callers drop it.
    pub fn audit(&self, record: AuditRecord) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let record_id = record.id.clone();
            if let Err(error) = sink.append_audit(record).await {
                warn!(
                    event_name = "audit.write_failed",
                    record_id = %record_id,
                    error = %error,
                    "audit record dropped"
                );
            }
        })
    }

    /// Submit a telemetry record in the background.
    pub fn telemetry(&self, record: TelemetryRecord) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let record_id = record.id.clone();
            if let Err(error) = sink.append_telemetry(record).await {
                warn!(
                    event_name = "telemetry.write_failed",
                    record_id = %record_id,
                    error = %error,
                    "telemetry record dropped"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::Recorder;
    use waypoint_core::audit::{AuditRecord, InMemoryRecordSink, RecordEvent, TelemetryRecord};

    #[tokio::test]
    async fn records_land_in_the_sink() {
        let sink = InMemoryRecordSink::new();
        let recorder = Recorder::new(Arc::new(sink.clone()));

        recorder
            .audit(AuditRecord::new(
                RecordEvent::Execute,
                "user-1",
                "add_day",
                "Added a new day to trip-1",
                json!({ "tripId": "trip-1" }),
            ))
            .await
            .expect("task completes");
        recorder
            .telemetry(TelemetryRecord::new("user-1", None, "msg-1", "claude"))
            .await
            .expect("task completes");

        assert_eq!(sink.audits().len(), 1);
        assert_eq!(sink.telemetry().len(), 1);
    }

    #[tokio::test]
    async fn sink_failure_is_swallowed() {
        let sink = InMemoryRecordSink::new();
        sink.set_failing(true);
        let recorder = Recorder::new(Arc::new(sink.clone()));

        recorder
            .audit(AuditRecord::new(
                RecordEvent::Preview,
                "user-1",
                "remove_day",
                "Remove Day 2",
                json!({}),
            ))
            .await
            .expect("task completes despite write failure");

        assert!(sink.audits().is_empty());
    }
}
