//! The action pipeline: validate, preview or execute, audit.
//!
//! Batch policy is strictly fail-fast: intents run in submission order,
//! the first failure aborts the remainder, and already-applied mutations
//! stand (the store is atomic per intent, not per batch). The caller gets
//! either every summary or the single first error, never a partial list.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use waypoint_core::audit::{AuditRecord, RecordEvent, RecordSink, TelemetryRecord};
use waypoint_core::config::GuardConfig;
use waypoint_core::errors::ActionError;
use waypoint_core::executor::ActionExecutor;
use waypoint_core::intent::{parse_request, ActionIntent};
use waypoint_core::preview::{build_preview, PreviewContext, PreviewResult};
use waypoint_core::store::{TripStore, UserId};

use crate::guard::{GuardVerdict, PromptGuard};
use crate::recorder::Recorder;

/// Aggregate response for a fully successful batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub summaries: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurnUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: Option<f64>,
}

/// One raw assistant turn, screened before intent generation.
#[derive(Clone, Debug, PartialEq)]
pub struct AssistantTurn {
    pub text: String,
    pub conversation_id: Option<String>,
    pub message_id: String,
    pub model: String,
    pub usage: Option<TurnUsage>,
}

#[derive(Clone)]
pub struct ActionPipeline {
    executor: ActionExecutor,
    guard: PromptGuard,
    guard_enabled: bool,
    recorder: Recorder,
}

impl ActionPipeline {
    pub fn new(
        store: Arc<dyn TripStore>,
        sink: Arc<dyn RecordSink>,
        guard_config: &GuardConfig,
    ) -> Self {
        Self {
            executor: ActionExecutor::new(store),
            guard: PromptGuard::default(),
            guard_enabled: guard_config.enabled,
            recorder: Recorder::new(sink),
        }
    }

    pub fn with_guard(mut self, guard: PromptGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Validate and execute a one-or-batch payload for `user_id`.
    ///
    /// Every execution attempt, including the failing one, triggers a
    /// non-blocking audit write.
    pub async fn submit_batch(
        &self,
        user_id: &UserId,
        payload: &Value,
    ) -> Result<BatchOutcome, ActionError> {
        let intents = parse_request(payload)?;

        let mut summaries = Vec::with_capacity(intents.len());
        for intent in &intents {
            match self.executor.execute(user_id, intent).await {
                Ok(result) => {
                    self.audit_attempt(user_id, intent, &result.summary);
                    summaries.push(result.summary);
                }
                Err(error) => {
                    self.audit_attempt(user_id, intent, &error.to_string());
                    return Err(error);
                }
            }
        }

        Ok(BatchOutcome { summaries })
    }

    /// Validate and preview a one-or-batch payload without mutating
    /// anything. Each preview is audited, also non-blocking.
    pub async fn preview_batch(
        &self,
        user_id: &UserId,
        payload: &Value,
        context: &PreviewContext,
    ) -> Result<Vec<PreviewResult>, ActionError> {
        let intents = parse_request(payload)?;

        let previews: Vec<PreviewResult> =
            intents.iter().map(|intent| build_preview(intent, context)).collect();
        for (intent, preview) in intents.iter().zip(&previews) {
            let _ = self.recorder.audit(AuditRecord::new(
                RecordEvent::Preview,
                user_id.0.clone(),
                intent.kind(),
                preview.summary.clone(),
                intent_payload(intent),
            ));
        }

        Ok(previews)
    }

    /// Screen one raw free-form turn upstream of intent generation and
    /// record the turn to telemetry. A disabled guard allows everything
    /// but still records.
    pub fn screen_turn(&self, user_id: &UserId, turn: &AssistantTurn) -> GuardVerdict {
        let verdict = if self.guard_enabled {
            self.guard.check(&turn.text)
        } else {
            GuardVerdict::Allow
        };

        let mut record = TelemetryRecord::new(
            user_id.0.clone(),
            turn.conversation_id.clone(),
            turn.message_id.clone(),
            turn.model.clone(),
        );
        if let Some(usage) = turn.usage {
            record = record.with_usage(usage.input_tokens, usage.output_tokens, usage.cost_usd);
        }
        if let GuardVerdict::Block { reason, .. } = &verdict {
            record = record.blocked(*reason);
        }
        let _ = self.recorder.telemetry(record);

        verdict
    }

    fn audit_attempt(&self, user_id: &UserId, intent: &ActionIntent, summary: &str) {
        let _ = self.recorder.audit(AuditRecord::new(
            RecordEvent::Execute,
            user_id.0.clone(),
            intent.kind(),
            summary,
            intent_payload(intent),
        ));
    }
}

fn intent_payload(intent: &ActionIntent) -> Value {
    serde_json::to_value(intent).unwrap_or(Value::Null)
}
