use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::engine::ledger;
use crate::error::AppError;
use crate::geo;
use crate::models::driver::{Driver, GeoPoint};
use crate::models::trip::{Trip, TripStatus};
use crate::state::AppState;

/// Creates a trip in `Pending`. Coordinates are validated up front, so the
/// fare can always be quoted and persisted here.
pub fn create_trip(
    state: &AppState,
    passenger_id: Uuid,
    origin: GeoPoint,
    destination: GeoPoint,
) -> Result<Trip, AppError> {
    geo::validate(&origin)?;
    geo::validate(&destination)?;

    let fare = state.fares.quote(&origin, &destination);
    let now = Utc::now();
    let trip = Trip {
        id: Uuid::new_v4(),
        passenger_id,
        driver_id: None,
        origin,
        destination,
        fare: Some(fare),
        status: TripStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    state.trips.insert(trip.id, trip.clone());
    state.metrics.trips_pending.inc();

    info!(trip_id = %trip.id, passenger_id = %passenger_id, fare, "trip created");
    Ok(trip)
}

/// A driver can take a trip iff approved and not already on one. Callers take
/// this as a snapshot; the authoritative check-and-set is `assign_trip`.
pub fn is_assignable(state: &AppState, driver: &Driver) -> bool {
    if !driver.approved {
        return false;
    }

    !state.trips.iter().any(|entry| {
        entry.driver_id == Some(driver.id)
            && matches!(entry.status, TripStatus::Assigned | TripStatus::InProgress)
    })
}

/// Compare-and-set assignment. The status check and the write happen under
/// the trip's exclusive map-entry guard; a concurrent winner leaves the loser
/// with `AlreadyAssigned` and no partial state.
pub fn assign_trip(state: &AppState, trip_id: Uuid, driver_id: Uuid) -> Result<Trip, AppError> {
    let driver = state
        .drivers
        .get(&driver_id)
        .map(|entry| entry.clone())
        .ok_or(AppError::DriverNotFound(driver_id))?;

    // Cheap pre-check so a lost race reads as such rather than as the winner
    // having made this driver busy.
    {
        let trip = state
            .trips
            .get(&trip_id)
            .ok_or(AppError::TripNotFound(trip_id))?;
        if trip.status != TripStatus::Pending {
            return Err(AppError::AlreadyAssigned(trip_id));
        }
    }

    // Snapshot read, taken outside the trip guard so no map iteration happens
    // while an entry lock is held.
    if !is_assignable(state, &driver) {
        return Err(AppError::DriverNotAssignable(driver_id));
    }

    let mut trip = state
        .trips
        .get_mut(&trip_id)
        .ok_or(AppError::TripNotFound(trip_id))?;

    if trip.status != TripStatus::Pending {
        return Err(AppError::AlreadyAssigned(trip_id));
    }

    trip.status = TripStatus::Assigned;
    trip.driver_id = Some(driver_id);
    trip.updated_at = Utc::now();
    state.metrics.trips_pending.dec();

    Ok(trip.clone())
}

/// Moves a trip along `Pending → Assigned → InProgress → Completed`, with
/// `Cancelled` reachable from `Pending` and `Assigned`. Completion credits
/// the driver's earnings with the persisted fare.
pub fn advance_trip(
    state: &AppState,
    trip_id: Uuid,
    next: TripStatus,
) -> Result<Trip, AppError> {
    let updated = {
        let mut trip = state
            .trips
            .get_mut(&trip_id)
            .ok_or(AppError::TripNotFound(trip_id))?;

        if !trip.status.can_advance_to(next) {
            return Err(AppError::InvalidTransition {
                from: trip.status,
                to: next,
            });
        }

        if trip.status == TripStatus::Pending {
            state.metrics.trips_pending.dec();
        }

        trip.status = next;
        trip.updated_at = Utc::now();
        trip.clone()
    };

    if next == TripStatus::Completed {
        if let Some(driver_id) = updated.driver_id {
            ledger::credit_trip(state, driver_id, &updated);
        }
    }

    info!(trip_id = %trip_id, status = ?next, "trip status advanced");
    Ok(updated)
}
