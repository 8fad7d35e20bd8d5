//! Non-mutating preview generation.
//!
//! Previews use caller-supplied human labels instead of raw identifiers so
//! this module stays decoupled from storage. Label resolution is the
//! caller's job; a missing label falls back to the raw id because a
//! summary must always be produced.

use serde::Serialize;
use serde_json::{json, Value};

use crate::intent::ActionIntent;

/// Human-readable labels for the entities an intent references.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviewContext {
    pub day_label: Option<String>,
    pub destination_name: Option<String>,
    pub from_day_label: Option<String>,
    pub to_day_label: Option<String>,
    pub trip_label: Option<String>,
}

impl PreviewContext {
    pub fn with_day_label(mut self, label: impl Into<String>) -> Self {
        self.day_label = Some(label.into());
        self
    }

    pub fn with_destination_name(mut self, name: impl Into<String>) -> Self {
        self.destination_name = Some(name.into());
        self
    }

    pub fn with_from_day_label(mut self, label: impl Into<String>) -> Self {
        self.from_day_label = Some(label.into());
        self
    }

    pub fn with_to_day_label(mut self, label: impl Into<String>) -> Self {
        self.to_day_label = Some(label.into());
        self
    }

    pub fn with_trip_label(mut self, label: impl Into<String>) -> Self {
        self.trip_label = Some(label.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub summary: String,
    pub requires_confirmation: bool,
    pub action: &'static str,
    pub details: Value,
}

fn or_id<'a>(label: &'a Option<String>, id: &'a str) -> &'a str {
    label.as_deref().unwrap_or(id)
}

/// Build a deterministic preview for one intent. Pure: no I/O, no
/// mutation. Every intent type currently requires confirmation; there is
/// no silent-apply variant.
pub fn build_preview(intent: &ActionIntent, context: &PreviewContext) -> PreviewResult {
    let (summary, details) = match intent {
        ActionIntent::AddDestination { day_id, destination, metadata } => (
            format!("Add {} to {}", destination.name, or_id(&context.day_label, day_id)),
            json!({
                "dayId": day_id,
                "destinationName": destination.name,
                "confidence": metadata.as_ref().and_then(|m| m.confidence),
            }),
        ),
        ActionIntent::RemoveDestination { day_id, destination_id } => (
            format!(
                "Remove {} from {}",
                or_id(&context.destination_name, destination_id),
                or_id(&context.day_label, day_id)
            ),
            json!({ "dayId": day_id, "destinationId": destination_id }),
        ),
        ActionIntent::MoveDestination { destination_id, from_day_id, to_day_id, insert_index } => {
            let destination = or_id(&context.destination_name, destination_id);
            let summary = if from_day_id == to_day_id {
                format!(
                    "Reorder {destination} within {}",
                    or_id(&context.from_day_label, from_day_id)
                )
            } else {
                format!(
                    "Move {destination} from {} to {}",
                    or_id(&context.from_day_label, from_day_id),
                    or_id(&context.to_day_label, to_day_id)
                )
            };
            (
                summary,
                json!({
                    "destinationId": destination_id,
                    "fromDayId": from_day_id,
                    "toDayId": to_day_id,
                    "insertIndex": insert_index,
                }),
            )
        }
        ActionIntent::ReorderDestinations { day_id, from_index, to_index } => (
            format!(
                "Reorder destinations in {}, moving position {} to position {}",
                or_id(&context.day_label, day_id),
                from_index,
                to_index
            ),
            json!({ "dayId": day_id, "fromIndex": from_index, "toIndex": to_index }),
        ),
        ActionIntent::SetDayLocation { day_id, location } => (
            format!("Set the location of {} to {location}", or_id(&context.day_label, day_id)),
            json!({ "dayId": day_id, "location": location }),
        ),
        ActionIntent::DuplicateDay { day_id } => (
            format!("Duplicate {}", or_id(&context.day_label, day_id)),
            json!({ "dayId": day_id }),
        ),
        ActionIntent::RemoveDay { day_id } => (
            format!("Remove {} from the trip", or_id(&context.day_label, day_id)),
            json!({ "dayId": day_id }),
        ),
        ActionIntent::AddDay { trip_id, date } => {
            let trip = or_id(&context.trip_label, trip_id);
            let summary = match date {
                Some(date) => format!("Add {date} as a new day to {trip}"),
                None => format!("Add a new day to {trip}"),
            };
            (summary, json!({ "tripId": trip_id, "date": date }))
        }
        ActionIntent::UpdateTripDates { trip_id, start_date, end_date } => (
            format!(
                "Update {} dates to {start_date} through {end_date}",
                or_id(&context.trip_label, trip_id)
            ),
            json!({ "tripId": trip_id, "startDate": start_date, "endDate": end_date }),
        ),
    };

    PreviewResult { summary, requires_confirmation: true, action: intent.kind(), details }
}
