pub mod audit;
pub mod config;
pub mod errors;
pub mod executor;
pub mod intent;
pub mod preview;
pub mod store;

pub use audit::{
    AuditRecord, InMemoryRecordSink, RecordEvent, RecordSink, SinkError, TelemetryRecord,
};
pub use errors::ActionError;
pub use executor::{ActionExecutor, ExecutionResult};
pub use intent::{
    parse_request, ActionIntent, DestinationDraft, IntentMetadata, MAX_BATCH_ACTIONS,
    MIN_BATCH_ACTIONS,
};
pub use preview::{build_preview, PreviewContext, PreviewResult};
pub use store::{
    DayId, DestinationId, InMemoryTripStore, MutationReceipt, SeedDay, SeedDestination, SeedTrip,
    StoreError, TripId, TripStore, UserId,
};
