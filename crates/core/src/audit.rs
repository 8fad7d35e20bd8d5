//! Audit and telemetry record types plus the durable sink seam.
//!
//! Both streams share the same best-effort contract: records transfer
//! ownership to the logging subsystem on submission and the caller never
//! owns or waits on their completion. Durability is not guaranteed; these
//! are observability records, not a correctness ledger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordEvent {
    Preview,
    Execute,
}

impl RecordEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Execute => "execute",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub event: RecordEvent,
    pub user_id: String,
    pub action_type: String,
    pub summary: String,
    pub payload: Value,
    pub occurred_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Timestamp is assigned here, at write time; records are created
    /// immediately before submission to the sink.
    pub fn new(
        event: RecordEvent,
        user_id: impl Into<String>,
        action_type: impl Into<String>,
        summary: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event,
            user_id: user_id.into(),
            action_type: action_type.into(),
            summary: summary.into(),
            payload,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub id: String,
    pub user_id: String,
    pub conversation_id: Option<String>,
    pub message_id: String,
    pub model: String,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub cost_usd: Option<f64>,
    pub blocked: bool,
    pub block_reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TelemetryRecord {
    pub fn new(
        user_id: impl Into<String>,
        conversation_id: Option<String>,
        message_id: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            conversation_id,
            message_id: message_id.into(),
            model: model.into(),
            input_tokens: None,
            output_tokens: None,
            cost_usd: None,
            blocked: false,
            block_reason: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_usage(
        mut self,
        input_tokens: u32,
        output_tokens: u32,
        cost_usd: Option<f64>,
    ) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self.cost_usd = cost_usd;
        self
    }

    pub fn blocked(mut self, reason: impl Into<String>) -> Self {
        self.blocked = true;
        self.block_reason = Some(reason.into());
        self
    }
}

#[derive(Clone, Debug, Error)]
pub enum SinkError {
    #[error("log sink write failed: {0}")]
    Write(String),
}

/// Append-only destination for the two record streams.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append_audit(&self, record: AuditRecord) -> Result<(), SinkError>;
    async fn append_telemetry(&self, record: TelemetryRecord) -> Result<(), SinkError>;
}

/// In-memory sink for tests, with a switch to simulate write failures.
#[derive(Clone, Default)]
pub struct InMemoryRecordSink {
    audits: Arc<Mutex<Vec<AuditRecord>>>,
    telemetry: Arc<Mutex<Vec<TelemetryRecord>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn audits(&self) -> Vec<AuditRecord> {
        match self.audits.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn telemetry(&self) -> Vec<TelemetryRecord> {
        match self.telemetry.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl RecordSink for InMemoryRecordSink {
    async fn append_audit(&self, record: AuditRecord) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Write("simulated audit failure".to_string()));
        }
        match self.audits.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
        Ok(())
    }

    async fn append_telemetry(&self, record: TelemetryRecord) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Write("simulated telemetry failure".to_string()));
        }
        match self.telemetry.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
        Ok(())
    }
}
