//! Assistant-facing action layer.
//!
//! Sits between the request handler and the core domain:
//! 1. **Prompt guard** (`guard`) - screens raw free-form text before it
//!    reaches intent generation. Already-structured intents are never
//!    screened here.
//! 2. **Pipeline** (`pipeline`) - validates a one-or-batch payload,
//!    previews or executes it fail-fast, and audits every attempt.
//! 3. **Recorder** (`recorder`) - fire-and-forget submission to the
//!    durable log sink; best-effort, log-on-failure.
//!
//! The assistant's language model is strictly upstream: it proposes
//! intents, it never mutates. All mutations flow through the validated
//! pipeline.

pub mod guard;
pub mod pipeline;
pub mod recorder;

pub use guard::{GuardRule, GuardVerdict, PromptGuard};
pub use pipeline::{ActionPipeline, AssistantTurn, BatchOutcome, TurnUsage};
pub use recorder::Recorder;
