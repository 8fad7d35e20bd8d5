//! Action execution against the trip store.
//!
//! Exactly one validated intent maps to exactly one store mutation call.
//! The store is atomic per intent: a failure means zero mutations were
//! applied for that intent. No retries happen at this layer.

use std::sync::Arc;

use serde::Serialize;

use crate::errors::ActionError;
use crate::intent::ActionIntent;
use crate::store::{DayId, DestinationId, MutationReceipt, StoreError, TripId, TripStore, UserId};

/// Past-tense confirmation for one successfully executed intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub summary: String,
}

#[derive(Clone)]
pub struct ActionExecutor {
    store: Arc<dyn TripStore>,
}

impl ActionExecutor {
    pub fn new(store: Arc<dyn TripStore>) -> Self {
        Self { store }
    }

    /// Execute one intent for `user_id`.
    ///
    /// Store failures map onto the pipeline taxonomy: missing entities are
    /// `NotFound`, ownership violations are `Forbidden`, business rules
    /// only checkable against live state (bad insert index, moving into a
    /// day that does not exist) are `Validation`.
    pub async fn execute(
        &self,
        user_id: &UserId,
        intent: &ActionIntent,
    ) -> Result<ExecutionResult, ActionError> {
        let receipt = match intent {
            ActionIntent::AddDestination { day_id, destination, .. } => {
                self.store
                    .add_destination(user_id, &DayId(day_id.clone()), destination)
                    .await
            }
            ActionIntent::RemoveDestination { day_id, destination_id } => {
                self.store
                    .remove_destination(
                        user_id,
                        &DayId(day_id.clone()),
                        &DestinationId(destination_id.clone()),
                    )
                    .await
            }
            ActionIntent::MoveDestination {
                destination_id,
                from_day_id,
                to_day_id,
                insert_index,
            } => {
                self.store
                    .move_destination(
                        user_id,
                        &DestinationId(destination_id.clone()),
                        &DayId(from_day_id.clone()),
                        &DayId(to_day_id.clone()),
                        *insert_index,
                    )
                    .await
            }
            ActionIntent::ReorderDestinations { day_id, from_index, to_index } => {
                self.store
                    .reorder_destinations(user_id, &DayId(day_id.clone()), *from_index, *to_index)
                    .await
            }
            ActionIntent::SetDayLocation { day_id, location } => {
                self.store.set_day_location(user_id, &DayId(day_id.clone()), location).await
            }
            ActionIntent::DuplicateDay { day_id } => {
                self.store.duplicate_day(user_id, &DayId(day_id.clone())).await
            }
            ActionIntent::RemoveDay { day_id } => {
                self.store.remove_day(user_id, &DayId(day_id.clone())).await
            }
            ActionIntent::AddDay { trip_id, date } => {
                self.store.add_day(user_id, &TripId(trip_id.clone()), *date).await
            }
            ActionIntent::UpdateTripDates { trip_id, start_date, end_date } => {
                self.store
                    .update_trip_dates(user_id, &TripId(trip_id.clone()), *start_date, *end_date)
                    .await
            }
        }
        .map_err(map_store_error)?;

        Ok(ExecutionResult { summary: confirmation_summary(intent, &receipt) })
    }
}

fn map_store_error(error: StoreError) -> ActionError {
    match error {
        StoreError::NotFound { .. } => ActionError::NotFound(error.to_string()),
        StoreError::Forbidden { .. } => ActionError::Forbidden(error.to_string()),
        StoreError::InvalidOperation(message) => ActionError::Validation(message),
        StoreError::Unavailable(message) => ActionError::Internal(message),
    }
}

fn or_id<'a>(label: &'a Option<String>, id: &'a str) -> &'a str {
    label.as_deref().unwrap_or(id)
}

/// Past-tense rewording of the preview phrasing families, filled from the
/// store receipt with raw-id fallback.
fn confirmation_summary(intent: &ActionIntent, receipt: &MutationReceipt) -> String {
    match intent {
        ActionIntent::AddDestination { day_id, destination, .. } => {
            format!("Added {} to {}", destination.name, or_id(&receipt.day_label, day_id))
        }
        ActionIntent::RemoveDestination { day_id, destination_id } => format!(
            "Removed {} from {}",
            or_id(&receipt.destination_name, destination_id),
            or_id(&receipt.day_label, day_id)
        ),
        ActionIntent::MoveDestination { destination_id, from_day_id, to_day_id, .. } => {
            let destination = or_id(&receipt.destination_name, destination_id);
            if from_day_id == to_day_id {
                format!(
                    "Reordered {destination} within {}",
                    or_id(&receipt.from_day_label, from_day_id)
                )
            } else {
                format!(
                    "Moved {destination} from {} to {}",
                    or_id(&receipt.from_day_label, from_day_id),
                    or_id(&receipt.to_day_label, to_day_id)
                )
            }
        }
        ActionIntent::ReorderDestinations { day_id, from_index, to_index } => format!(
            "Reordered destinations in {}, moving position {} to position {}",
            or_id(&receipt.day_label, day_id),
            from_index,
            to_index
        ),
        ActionIntent::SetDayLocation { day_id, location } => {
            format!("Set the location of {} to {location}", or_id(&receipt.day_label, day_id))
        }
        ActionIntent::DuplicateDay { day_id } => {
            format!("Duplicated {}", or_id(&receipt.day_label, day_id))
        }
        ActionIntent::RemoveDay { day_id } => {
            format!("Removed {} from the trip", or_id(&receipt.day_label, day_id))
        }
        ActionIntent::AddDay { trip_id, date } => {
            let trip = or_id(&receipt.trip_label, trip_id);
            match date {
                Some(date) => format!("Added {date} as a new day to {trip}"),
                None => format!("Added a new day to {trip}"),
            }
        }
        ActionIntent::UpdateTripDates { trip_id, start_date, end_date } => format!(
            "Updated {} dates to {start_date} through {end_date}",
            or_id(&receipt.trip_label, trip_id)
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::ActionExecutor;
    use crate::errors::ActionError;
    use crate::intent::{ActionIntent, DestinationDraft};
    use crate::store::{InMemoryTripStore, SeedDay, SeedDestination, SeedTrip, UserId};

    fn owner() -> UserId {
        UserId("user-1".to_string())
    }

    fn seeded_store() -> InMemoryTripStore {
        let store = InMemoryTripStore::new();
        store.insert_trip(
            &owner(),
            SeedTrip {
                id: "trip-1".to_string(),
                name: "Japan Spring Trip".to_string(),
                start_date: None,
                end_date: None,
                days: vec![SeedDay {
                    id: "day-5".to_string(),
                    label: "Day 5 (Apr 18)".to_string(),
                    location: None,
                    destinations: vec![SeedDestination {
                        id: "dest-10".to_string(),
                        name: "Gallery Visit".to_string(),
                    }],
                }],
            },
        );
        store
    }

    fn executor(store: &InMemoryTripStore) -> ActionExecutor {
        ActionExecutor::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn successful_add_produces_past_tense_summary() {
        let store = seeded_store();
        let result = executor(&store)
            .execute(
                &owner(),
                &ActionIntent::AddDestination {
                    day_id: "day-5".to_string(),
                    destination: DestinationDraft {
                        name: "Evening Food Tour".to_string(),
                        address: None,
                        notes: None,
                    },
                    metadata: None,
                },
            )
            .await
            .expect("execute succeeds");

        assert_eq!(result.summary, "Added Evening Food Tour to Day 5 (Apr 18)");
    }

    #[tokio::test]
    async fn missing_day_surfaces_not_found() {
        let store = seeded_store();
        let error = executor(&store)
            .execute(&owner(), &ActionIntent::RemoveDay { day_id: "day-404".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(error, ActionError::NotFound(_)));
    }

    #[tokio::test]
    async fn foreign_trip_surfaces_forbidden() {
        let store = seeded_store();
        let error = executor(&store)
            .execute(
                &UserId("intruder".to_string()),
                &ActionIntent::RemoveDay { day_id: "day-5".to_string() },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, ActionError::Forbidden(_)));
    }

    #[tokio::test]
    async fn exec_time_business_rule_surfaces_validation() {
        let store = seeded_store();
        let error = executor(&store)
            .execute(
                &owner(),
                &ActionIntent::MoveDestination {
                    destination_id: "dest-10".to_string(),
                    from_day_id: "day-5".to_string(),
                    to_day_id: "day-404".to_string(),
                    insert_index: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, ActionError::Validation(_)));
    }

    #[tokio::test]
    async fn same_day_move_confirmation_reads_as_reordered() {
        let store = seeded_store();
        let result = executor(&store)
            .execute(
                &owner(),
                &ActionIntent::MoveDestination {
                    destination_id: "dest-10".to_string(),
                    from_day_id: "day-5".to_string(),
                    to_day_id: "day-5".to_string(),
                    insert_index: 0,
                },
            )
            .await
            .expect("execute succeeds");

        assert!(result.summary.starts_with("Reordered"));
        assert!(result.summary.contains("Gallery Visit"));
    }
}
