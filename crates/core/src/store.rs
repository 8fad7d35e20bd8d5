//! Trip store seam.
//!
//! The trip data store is an external collaborator: it owns persistence
//! and per-trip mutation consistency. The pipeline only depends on this
//! trait. Each method is one atomic mutation returning either a receipt
//! with human labels (for confirmation summaries) or a typed failure.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::intent::DestinationDraft;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DestinationId(pub String);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{entity} {id} does not belong to the requesting user")]
    Forbidden { entity: &'static str, id: String },
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Labels describing what a successful mutation touched. Optional fields:
/// the executor falls back to raw identifiers when a label is absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationReceipt {
    pub destination_name: Option<String>,
    pub day_label: Option<String>,
    pub from_day_label: Option<String>,
    pub to_day_label: Option<String>,
    pub trip_label: Option<String>,
}

#[async_trait]
pub trait TripStore: Send + Sync {
    async fn add_destination(
        &self,
        user_id: &UserId,
        day_id: &DayId,
        destination: &DestinationDraft,
    ) -> Result<MutationReceipt, StoreError>;

    async fn remove_destination(
        &self,
        user_id: &UserId,
        day_id: &DayId,
        destination_id: &DestinationId,
    ) -> Result<MutationReceipt, StoreError>;

    async fn move_destination(
        &self,
        user_id: &UserId,
        destination_id: &DestinationId,
        from_day_id: &DayId,
        to_day_id: &DayId,
        insert_index: u32,
    ) -> Result<MutationReceipt, StoreError>;

    async fn reorder_destinations(
        &self,
        user_id: &UserId,
        day_id: &DayId,
        from_index: u32,
        to_index: u32,
    ) -> Result<MutationReceipt, StoreError>;

    async fn set_day_location(
        &self,
        user_id: &UserId,
        day_id: &DayId,
        location: &str,
    ) -> Result<MutationReceipt, StoreError>;

    async fn duplicate_day(
        &self,
        user_id: &UserId,
        day_id: &DayId,
    ) -> Result<MutationReceipt, StoreError>;

    async fn remove_day(
        &self,
        user_id: &UserId,
        day_id: &DayId,
    ) -> Result<MutationReceipt, StoreError>;

    async fn add_day(
        &self,
        user_id: &UserId,
        trip_id: &TripId,
        date: Option<NaiveDate>,
    ) -> Result<MutationReceipt, StoreError>;

    async fn update_trip_dates(
        &self,
        user_id: &UserId,
        trip_id: &TripId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<MutationReceipt, StoreError>;
}

// Seeding shapes for the in-memory store.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedDestination {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedDay {
    pub id: String,
    pub label: String,
    pub location: Option<String>,
    pub destinations: Vec<SeedDestination>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedTrip {
    pub id: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days: Vec<SeedDay>,
}

#[derive(Clone, Debug)]
struct StoredDestination {
    id: String,
    name: String,
}

#[derive(Clone, Debug)]
struct StoredDay {
    id: String,
    label: String,
    location: Option<String>,
    destinations: Vec<StoredDestination>,
}

#[derive(Clone, Debug)]
struct StoredTrip {
    owner: UserId,
    name: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    days: Vec<StoredDay>,
}

#[derive(Debug, Default)]
struct StoreState {
    trips: BTreeMap<String, StoredTrip>,
    calls: Vec<String>,
}

/// In-memory `TripStore` for tests and local runs. Mutations are atomic
/// per call: every check happens before the state is touched. A call log
/// records which mutations were attempted, in order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTripStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_trip(&self, owner: &UserId, seed: SeedTrip) {
        let trip = StoredTrip {
            owner: owner.clone(),
            name: seed.name,
            start_date: seed.start_date,
            end_date: seed.end_date,
            days: seed
                .days
                .into_iter()
                .map(|day| StoredDay {
                    id: day.id,
                    label: day.label,
                    location: day.location,
                    destinations: day
                        .destinations
                        .into_iter()
                        .map(|destination| StoredDestination {
                            id: destination.id,
                            name: destination.name,
                        })
                        .collect(),
                })
                .collect(),
        };
        self.lock().trips.insert(seed.id, trip);
    }

    /// Ordered log of attempted mutations, e.g. `add_destination day-5`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn destination_count(&self, day_id: &DayId) -> Option<usize> {
        let state = self.lock();
        state
            .trips
            .values()
            .flat_map(|trip| trip.days.iter())
            .find(|day| day.id == day_id.0)
            .map(|day| day.destinations.len())
    }

    pub fn day_count(&self, trip_id: &TripId) -> Option<usize> {
        self.lock().trips.get(&trip_id.0).map(|trip| trip.days.len())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn log(state: &mut StoreState, operation: &str, target: &str) {
        state.calls.push(format!("{operation} {target}"));
    }
}

fn find_trip_for_day<'a>(
    state: &'a mut StoreState,
    user_id: &UserId,
    day_id: &DayId,
) -> Result<&'a mut StoredTrip, StoreError> {
    let trip_key = state
        .trips
        .iter()
        .find(|(_, trip)| trip.days.iter().any(|day| day.id == day_id.0))
        .map(|(key, _)| key.clone())
        .ok_or_else(|| StoreError::NotFound { entity: "day", id: day_id.0.clone() })?;

    let trip = state.trips.get_mut(&trip_key).ok_or_else(|| StoreError::NotFound {
        entity: "day",
        id: day_id.0.clone(),
    })?;
    if &trip.owner != user_id {
        return Err(StoreError::Forbidden { entity: "day", id: day_id.0.clone() });
    }
    Ok(trip)
}

fn find_owned_trip<'a>(
    state: &'a mut StoreState,
    user_id: &UserId,
    trip_id: &TripId,
) -> Result<&'a mut StoredTrip, StoreError> {
    let trip = state
        .trips
        .get_mut(&trip_id.0)
        .ok_or_else(|| StoreError::NotFound { entity: "trip", id: trip_id.0.clone() })?;
    if &trip.owner != user_id {
        return Err(StoreError::Forbidden { entity: "trip", id: trip_id.0.clone() });
    }
    Ok(trip)
}

fn day_mut<'a>(trip: &'a mut StoredTrip, day_id: &DayId) -> Result<&'a mut StoredDay, StoreError> {
    trip.days
        .iter_mut()
        .find(|day| day.id == day_id.0)
        .ok_or_else(|| StoreError::NotFound { entity: "day", id: day_id.0.clone() })
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn add_destination(
        &self,
        user_id: &UserId,
        day_id: &DayId,
        destination: &DestinationDraft,
    ) -> Result<MutationReceipt, StoreError> {
        let mut state = self.lock();
        Self::log(&mut state, "add_destination", &day_id.0);
        let trip = find_trip_for_day(&mut state, user_id, day_id)?;
        let day = day_mut(trip, day_id)?;
        day.destinations.push(StoredDestination {
            id: Uuid::new_v4().to_string(),
            name: destination.name.clone(),
        });
        Ok(MutationReceipt {
            destination_name: Some(destination.name.clone()),
            day_label: Some(day.label.clone()),
            ..MutationReceipt::default()
        })
    }

    async fn remove_destination(
        &self,
        user_id: &UserId,
        day_id: &DayId,
        destination_id: &DestinationId,
    ) -> Result<MutationReceipt, StoreError> {
        let mut state = self.lock();
        Self::log(&mut state, "remove_destination", &destination_id.0);
        let trip = find_trip_for_day(&mut state, user_id, day_id)?;
        let day = day_mut(trip, day_id)?;
        let position = day
            .destinations
            .iter()
            .position(|destination| destination.id == destination_id.0)
            .ok_or_else(|| StoreError::NotFound {
                entity: "destination",
                id: destination_id.0.clone(),
            })?;
        let removed = day.destinations.remove(position);
        Ok(MutationReceipt {
            destination_name: Some(removed.name),
            day_label: Some(day.label.clone()),
            ..MutationReceipt::default()
        })
    }

    async fn move_destination(
        &self,
        user_id: &UserId,
        destination_id: &DestinationId,
        from_day_id: &DayId,
        to_day_id: &DayId,
        insert_index: u32,
    ) -> Result<MutationReceipt, StoreError> {
        let mut state = self.lock();
        Self::log(&mut state, "move_destination", &destination_id.0);
        let trip = find_trip_for_day(&mut state, user_id, from_day_id)?;

        // All checks before any mutation: the call must be atomic.
        let from_position = {
            let from_day = trip
                .days
                .iter()
                .find(|day| day.id == from_day_id.0)
                .ok_or_else(|| StoreError::NotFound { entity: "day", id: from_day_id.0.clone() })?;
            from_day
                .destinations
                .iter()
                .position(|destination| destination.id == destination_id.0)
                .ok_or_else(|| StoreError::NotFound {
                    entity: "destination",
                    id: destination_id.0.clone(),
                })?
        };
        let to_exists = trip.days.iter().any(|day| day.id == to_day_id.0);
        if !to_exists {
            return Err(StoreError::InvalidOperation(format!(
                "cannot move into day `{}`: day does not exist",
                to_day_id.0
            )));
        }
        let target_len = trip
            .days
            .iter()
            .find(|day| day.id == to_day_id.0)
            .map(|day| day.destinations.len())
            .unwrap_or_default();
        let same_day = from_day_id == to_day_id;
        // A same-day move removes before reinserting, so the upper bound
        // excludes the moved item itself.
        let max_index = if same_day { target_len.saturating_sub(1) } else { target_len };
        if insert_index as usize > max_index {
            return Err(StoreError::InvalidOperation(format!(
                "insert index {insert_index} is beyond the day's {target_len} destinations"
            )));
        }

        let from_label = trip
            .days
            .iter()
            .find(|day| day.id == from_day_id.0)
            .map(|day| day.label.clone());
        let moved = {
            let from_day = day_mut(trip, from_day_id)?;
            from_day.destinations.remove(from_position)
        };
        let to_day = day_mut(trip, to_day_id)?;
        let name = moved.name.clone();
        to_day.destinations.insert(insert_index as usize, moved);

        Ok(MutationReceipt {
            destination_name: Some(name),
            from_day_label: from_label,
            to_day_label: Some(to_day.label.clone()),
            ..MutationReceipt::default()
        })
    }

    async fn reorder_destinations(
        &self,
        user_id: &UserId,
        day_id: &DayId,
        from_index: u32,
        to_index: u32,
    ) -> Result<MutationReceipt, StoreError> {
        let mut state = self.lock();
        Self::log(&mut state, "reorder_destinations", &day_id.0);
        let trip = find_trip_for_day(&mut state, user_id, day_id)?;
        let day = day_mut(trip, day_id)?;
        let len = day.destinations.len();
        if from_index as usize >= len || to_index as usize >= len {
            return Err(StoreError::InvalidOperation(format!(
                "reorder indexes {from_index}..{to_index} are beyond the day's {len} destinations"
            )));
        }
        let destination = day.destinations.remove(from_index as usize);
        day.destinations.insert(to_index as usize, destination);
        Ok(MutationReceipt { day_label: Some(day.label.clone()), ..MutationReceipt::default() })
    }

    async fn set_day_location(
        &self,
        user_id: &UserId,
        day_id: &DayId,
        location: &str,
    ) -> Result<MutationReceipt, StoreError> {
        let mut state = self.lock();
        Self::log(&mut state, "set_day_location", &day_id.0);
        let trip = find_trip_for_day(&mut state, user_id, day_id)?;
        let day = day_mut(trip, day_id)?;
        day.location = Some(location.to_string());
        Ok(MutationReceipt { day_label: Some(day.label.clone()), ..MutationReceipt::default() })
    }

    async fn duplicate_day(
        &self,
        user_id: &UserId,
        day_id: &DayId,
    ) -> Result<MutationReceipt, StoreError> {
        let mut state = self.lock();
        Self::log(&mut state, "duplicate_day", &day_id.0);
        let trip = find_trip_for_day(&mut state, user_id, day_id)?;
        let position = trip
            .days
            .iter()
            .position(|day| day.id == day_id.0)
            .ok_or_else(|| StoreError::NotFound { entity: "day", id: day_id.0.clone() })?;
        let source = trip.days[position].clone();
        let copy = StoredDay {
            id: Uuid::new_v4().to_string(),
            label: format!("{} (copy)", source.label),
            location: source.location.clone(),
            destinations: source
                .destinations
                .iter()
                .map(|destination| StoredDestination {
                    id: Uuid::new_v4().to_string(),
                    name: destination.name.clone(),
                })
                .collect(),
        };
        trip.days.insert(position + 1, copy);
        Ok(MutationReceipt { day_label: Some(source.label), ..MutationReceipt::default() })
    }

    async fn remove_day(
        &self,
        user_id: &UserId,
        day_id: &DayId,
    ) -> Result<MutationReceipt, StoreError> {
        let mut state = self.lock();
        Self::log(&mut state, "remove_day", &day_id.0);
        let trip = find_trip_for_day(&mut state, user_id, day_id)?;
        let position = trip
            .days
            .iter()
            .position(|day| day.id == day_id.0)
            .ok_or_else(|| StoreError::NotFound { entity: "day", id: day_id.0.clone() })?;
        let removed = trip.days.remove(position);
        Ok(MutationReceipt { day_label: Some(removed.label), ..MutationReceipt::default() })
    }

    async fn add_day(
        &self,
        user_id: &UserId,
        trip_id: &TripId,
        date: Option<NaiveDate>,
    ) -> Result<MutationReceipt, StoreError> {
        let mut state = self.lock();
        Self::log(&mut state, "add_day", &trip_id.0);
        let trip = find_owned_trip(&mut state, user_id, trip_id)?;
        let label = match date {
            Some(date) => format!("Day {} ({date})", trip.days.len() + 1),
            None => format!("Day {}", trip.days.len() + 1),
        };
        trip.days.push(StoredDay {
            id: Uuid::new_v4().to_string(),
            label: label.clone(),
            location: None,
            destinations: Vec::new(),
        });
        Ok(MutationReceipt {
            day_label: Some(label),
            trip_label: Some(trip.name.clone()),
            ..MutationReceipt::default()
        })
    }

    async fn update_trip_dates(
        &self,
        user_id: &UserId,
        trip_id: &TripId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<MutationReceipt, StoreError> {
        let mut state = self.lock();
        Self::log(&mut state, "update_trip_dates", &trip_id.0);
        let trip = find_owned_trip(&mut state, user_id, trip_id)?;
        trip.start_date = Some(start_date);
        trip.end_date = Some(end_date);
        Ok(MutationReceipt { trip_label: Some(trip.name.clone()), ..MutationReceipt::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DayId, DestinationId, InMemoryTripStore, SeedDay, SeedDestination, SeedTrip, StoreError,
        TripId, TripStore, UserId,
    };
    use crate::intent::DestinationDraft;

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
                days: vec![
                    SeedDay {
                        id: "day-1".to_string(),
                        label: "Day 1 (Apr 10)".to_string(),
                        location: Some("Tokyo".to_string()),
                        destinations: vec![
                            SeedDestination { id: "dest-1".to_string(), name: "Senso-ji".to_string() },
                            SeedDestination {
                                id: "dest-2".to_string(),
                                name: "Ueno Park".to_string(),
                            },
                        ],
                    },
                    SeedDay {
                        id: "day-2".to_string(),
                        label: "Day 2 (Apr 11)".to_string(),
                        location: None,
                        destinations: vec![SeedDestination {
                            id: "dest-3".to_string(),
                            name: "Gallery Visit".to_string(),
                        }],
                    },
                ],
            },
        );
        store
    }

    fn draft(name: &str) -> DestinationDraft {
        DestinationDraft { name: name.to_string(), address: None, notes: None }
    }

    #[tokio::test]
    async fn add_destination_appends_and_reports_labels() {
        let store = seeded_store();
        let receipt = store
            .add_destination(&owner(), &DayId("day-1".to_string()), &draft("Meiji Shrine"))
            .await
            .expect("add succeeds");

        assert_eq!(receipt.destination_name.as_deref(), Some("Meiji Shrine"));
        assert_eq!(receipt.day_label.as_deref(), Some("Day 1 (Apr 10)"));
        assert_eq!(store.destination_count(&DayId("day-1".to_string())), Some(3));
    }

    #[tokio::test]
    async fn mutations_against_unknown_day_fail_with_not_found() {
        let store = seeded_store();
        let error = store
            .add_destination(&owner(), &DayId("day-99".to_string()), &draft("Nowhere"))
            .await
            .unwrap_err();
        assert_eq!(error, StoreError::NotFound { entity: "day", id: "day-99".to_string() });
    }

    #[tokio::test]
    async fn mutations_by_a_stranger_fail_with_forbidden() {
        let store = seeded_store();
        let error = store
            .remove_day(&UserId("intruder".to_string()), &DayId("day-1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::Forbidden { entity: "day", .. }));
    }

    #[tokio::test]
    async fn move_into_missing_day_is_invalid_operation_and_leaves_state_intact() {
        let store = seeded_store();
        let error = store
            .move_destination(
                &owner(),
                &DestinationId("dest-1".to_string()),
                &DayId("day-1".to_string()),
                &DayId("day-404".to_string()),
                0,
            )
            .await
            .unwrap_err();

        assert!(matches!(error, StoreError::InvalidOperation(_)));
        assert_eq!(store.destination_count(&DayId("day-1".to_string())), Some(2));
    }

    #[tokio::test]
    async fn move_with_out_of_range_insert_index_is_invalid_operation() {
        let store = seeded_store();
        let error = store
            .move_destination(
                &owner(),
                &DestinationId("dest-1".to_string()),
                &DayId("day-1".to_string()),
                &DayId("day-2".to_string()),
                5,
            )
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn cross_day_move_relocates_the_destination() {
        let store = seeded_store();
        let receipt = store
            .move_destination(
                &owner(),
                &DestinationId("dest-1".to_string()),
                &DayId("day-1".to_string()),
                &DayId("day-2".to_string()),
                1,
            )
            .await
            .expect("move succeeds");

        assert_eq!(receipt.destination_name.as_deref(), Some("Senso-ji"));
        assert_eq!(receipt.from_day_label.as_deref(), Some("Day 1 (Apr 10)"));
        assert_eq!(receipt.to_day_label.as_deref(), Some("Day 2 (Apr 11)"));
        assert_eq!(store.destination_count(&DayId("day-1".to_string())), Some(1));
        assert_eq!(store.destination_count(&DayId("day-2".to_string())), Some(2));
    }

    #[tokio::test]
    async fn duplicate_day_copies_destinations_under_fresh_ids() {
        let store = seeded_store();
        store.duplicate_day(&owner(), &DayId("day-1".to_string())).await.expect("duplicate");
        assert_eq!(store.day_count(&TripId("trip-1".to_string())), Some(3));
    }

    #[tokio::test]
    async fn call_log_records_attempts_in_order() {
        let store = seeded_store();
        let _ = store.remove_day(&owner(), &DayId("day-2".to_string())).await;
        let _ = store.add_day(&owner(), &TripId("trip-1".to_string()), None).await;

        assert_eq!(store.calls(), vec!["remove_day day-2", "add_day trip-1"]);
    }
}
