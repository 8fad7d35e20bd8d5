//! Contract tests for the durable log sink: both streams append and
//! round-trip their fields through SQLite.

use serde_json::json;
use sqlx::Row;

use waypoint_core::audit::{AuditRecord, RecordEvent, RecordSink, TelemetryRecord};
use waypoint_db::{connect_with_settings, migrations, SqlRecordSink};

async fn test_pool() -> waypoint_db::DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    pool
}

#[tokio::test]
async fn audit_records_append_and_round_trip() {
    let pool = test_pool().await;
    let sink = SqlRecordSink::new(pool.clone());

    let record = AuditRecord::new(
        RecordEvent::Execute,
        "user-1",
        "add_destination",
        "Added Evening Food Tour to Day 5 (Apr 18)",
        json!({ "dayId": "day-5" }),
    );
    let record_id = record.id.clone();
    sink.append_audit(record).await.expect("append");

    let row = sqlx::query("SELECT event, user_id, action_type, summary, payload FROM audit_record WHERE id = ?")
        .bind(&record_id)
        .fetch_one(&pool)
        .await
        .expect("row present");

    assert_eq!(row.get::<String, _>("event"), "execute");
    assert_eq!(row.get::<String, _>("user_id"), "user-1");
    assert_eq!(row.get::<String, _>("action_type"), "add_destination");
    assert!(row.get::<String, _>("summary").contains("Evening Food Tour"));
    let payload: serde_json::Value =
        serde_json::from_str(&row.get::<String, _>("payload")).expect("payload is json");
    assert_eq!(payload["dayId"], "day-5");
}

#[tokio::test]
async fn telemetry_records_append_with_optional_fields() {
    let pool = test_pool().await;
    let sink = SqlRecordSink::new(pool.clone());

    let allowed = TelemetryRecord::new("user-1", Some("conv-1".to_string()), "msg-1", "claude")
        .with_usage(250, 80, Some(0.004));
    let blocked = TelemetryRecord::new("user-1", None, "msg-2", "claude").blocked("self_harm");
    sink.append_telemetry(allowed).await.expect("append allowed");
    sink.append_telemetry(blocked).await.expect("append blocked");

    let rows = sqlx::query(
        "SELECT message_id, input_tokens, blocked, block_reason FROM telemetry_record ORDER BY message_id",
    )
    .fetch_all(&pool)
    .await
    .expect("rows");
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].get::<String, _>("message_id"), "msg-1");
    assert_eq!(rows[0].get::<Option<i64>, _>("input_tokens"), Some(250));
    assert!(!rows[0].get::<bool, _>("blocked"));

    assert_eq!(rows[1].get::<String, _>("message_id"), "msg-2");
    assert!(rows[1].get::<bool, _>("blocked"));
    assert_eq!(rows[1].get::<Option<String>, _>("block_reason").as_deref(), Some("self_harm"));
}

#[tokio::test]
async fn append_against_a_closed_pool_reports_a_write_error() {
    let pool = test_pool().await;
    let sink = SqlRecordSink::new(pool.clone());
    pool.close().await;

    let result = sink
        .append_audit(AuditRecord::new(
            RecordEvent::Preview,
            "user-1",
            "remove_day",
            "Remove Day 2",
            json!({}),
        ))
        .await;
    assert!(result.is_err());
}
