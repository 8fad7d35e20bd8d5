//! Action intent schema and structural validation.
//!
//! The assistant emits structured intents; this module is the boundary
//! where a raw JSON payload becomes a closed, exhaustively-matchable
//! `ActionIntent`. Unknown discriminants are rejected here, never coerced.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ActionError;

pub const MIN_BATCH_ACTIONS: usize = 1;
pub const MAX_BATCH_ACTIONS: usize = 6;

/// Closed set of wire discriminants. Kept in sync with `ActionIntent` by
/// the exhaustive match in `ActionIntent::kind`.
pub const KNOWN_ACTION_TYPES: &[&str] = &[
    "add_destination",
    "remove_destination",
    "move_destination",
    "reorder_destinations",
    "set_day_location",
    "duplicate_day",
    "remove_day",
    "add_day",
    "update_trip_dates",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Assistant-supplied extraction metadata. Carried through to audit
/// payloads but never consulted when executing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionIntent {
    #[serde(rename_all = "camelCase")]
    AddDestination {
        day_id: String,
        destination: DestinationDraft,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<IntentMetadata>,
    },
    #[serde(rename_all = "camelCase")]
    RemoveDestination { day_id: String, destination_id: String },
    #[serde(rename_all = "camelCase")]
    MoveDestination {
        destination_id: String,
        from_day_id: String,
        to_day_id: String,
        insert_index: u32,
    },
    #[serde(rename_all = "camelCase")]
    ReorderDestinations { day_id: String, from_index: u32, to_index: u32 },
    #[serde(rename_all = "camelCase")]
    SetDayLocation { day_id: String, location: String },
    #[serde(rename_all = "camelCase")]
    DuplicateDay { day_id: String },
    #[serde(rename_all = "camelCase")]
    RemoveDay { day_id: String },
    #[serde(rename_all = "camelCase")]
    AddDay {
        trip_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<NaiveDate>,
    },
    #[serde(rename_all = "camelCase")]
    UpdateTripDates { trip_id: String, start_date: NaiveDate, end_date: NaiveDate },
}

impl ActionIntent {
    /// Wire discriminant for this intent.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddDestination { .. } => "add_destination",
            Self::RemoveDestination { .. } => "remove_destination",
            Self::MoveDestination { .. } => "move_destination",
            Self::ReorderDestinations { .. } => "reorder_destinations",
            Self::SetDayLocation { .. } => "set_day_location",
            Self::DuplicateDay { .. } => "duplicate_day",
            Self::RemoveDay { .. } => "remove_day",
            Self::AddDay { .. } => "add_day",
            Self::UpdateTripDates { .. } => "update_trip_dates",
        }
    }

    /// Domain checks beyond structural shape: value ranges and field
    /// relationships serde cannot express.
    pub fn validate(&self) -> Result<(), ActionError> {
        match self {
            Self::AddDestination { destination, metadata, .. } => {
                if destination.name.trim().is_empty() {
                    return Err(ActionError::Validation(
                        "destination name must not be empty".to_string(),
                    ));
                }
                if let Some(confidence) = metadata.as_ref().and_then(|m| m.confidence) {
                    if !(0.0..=1.0).contains(&confidence) {
                        return Err(ActionError::Validation(format!(
                            "confidence must be within [0, 1], got {confidence}"
                        )));
                    }
                }
                Ok(())
            }
            Self::SetDayLocation { location, .. } => {
                if location.trim().is_empty() {
                    return Err(ActionError::Validation("location must not be empty".to_string()));
                }
                Ok(())
            }
            Self::UpdateTripDates { start_date, end_date, .. } => {
                if start_date > end_date {
                    return Err(ActionError::Validation(format!(
                        "start date {start_date} is after end date {end_date}"
                    )));
                }
                Ok(())
            }
            Self::RemoveDestination { .. }
            | Self::MoveDestination { .. }
            | Self::ReorderDestinations { .. }
            | Self::DuplicateDay { .. }
            | Self::RemoveDay { .. }
            | Self::AddDay { .. } => Ok(()),
        }
    }
}

/// Parse a request payload carrying either `{"action": {…}}` or
/// `{"actions": […]}` into an ordered list of validated intents.
///
/// Pure and synchronous; batch bounds are enforced before any per-intent
/// work.
pub fn parse_request(payload: &Value) -> Result<Vec<ActionIntent>, ActionError> {
    let raw_actions: Vec<&Value> = if let Some(action) = payload.get("action") {
        vec![action]
    } else if let Some(actions) = payload.get("actions") {
        actions
            .as_array()
            .ok_or_else(|| ActionError::Validation("`actions` must be an array".to_string()))?
            .iter()
            .collect()
    } else {
        return Err(ActionError::Validation(
            "request must carry an `action` object or an `actions` array".to_string(),
        ));
    };

    if raw_actions.len() < MIN_BATCH_ACTIONS || raw_actions.len() > MAX_BATCH_ACTIONS {
        return Err(ActionError::Validation(format!(
            "batch size out of bounds: got {}, expected {MIN_BATCH_ACTIONS}..={MAX_BATCH_ACTIONS}",
            raw_actions.len()
        )));
    }

    raw_actions.into_iter().map(parse_intent).collect()
}

/// Parse and validate a single raw intent object.
pub fn parse_intent(raw: &Value) -> Result<ActionIntent, ActionError> {
    let action_type = raw
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ActionError::Validation("action is missing a `type` field".to_string()))?;

    if !KNOWN_ACTION_TYPES.contains(&action_type) {
        return Err(ActionError::Validation(format!("unknown action type `{action_type}`")));
    }

    let intent: ActionIntent = serde_json::from_value(raw.clone()).map_err(|error| {
        ActionError::Validation(format!("malformed `{action_type}` action: {error}"))
    })?;
    intent.validate()?;
    Ok(intent)
}
