//! Durable record sink backed by SQLite.
//!
//! Two logically separate append-only streams share the same write
//! contract. Rows are never updated or deleted here; retention is an
//! operational concern outside this crate.

use async_trait::async_trait;

use waypoint_core::audit::{AuditRecord, RecordSink, SinkError, TelemetryRecord};

use crate::DbPool;

pub struct SqlRecordSink {
    pool: DbPool,
}

impl SqlRecordSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSink for SqlRecordSink {
    async fn append_audit(&self, record: AuditRecord) -> Result<(), SinkError> {
        sqlx::query(
            "INSERT INTO audit_record (id, event, user_id, action_type, summary, payload, occurred_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(record.event.as_str())
        .bind(&record.user_id)
        .bind(&record.action_type)
        .bind(&record.summary)
        .bind(record.payload.to_string())
        .bind(record.occurred_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|error| SinkError::Write(error.to_string()))?;
        Ok(())
    }

    async fn append_telemetry(&self, record: TelemetryRecord) -> Result<(), SinkError> {
        sqlx::query(
            "INSERT INTO telemetry_record (id, user_id, conversation_id, message_id, model,
                                           input_tokens, output_tokens, cost_usd, blocked,
                                           block_reason, occurred_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.conversation_id)
        .bind(&record.message_id)
        .bind(&record.model)
        .bind(record.input_tokens)
        .bind(record.output_tokens)
        .bind(record.cost_usd)
        .bind(record.blocked)
        .bind(&record.block_reason)
        .bind(record.occurred_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|error| SinkError::Write(error.to_string()))?;
        Ok(())
    }
}
