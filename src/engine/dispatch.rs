use std::time::Instant;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::engine::lifecycle;
use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::dispatch::DispatchNotice;
use crate::models::driver::Driver;
use crate::models::trip::{Trip, TripStatus};
use crate::state::AppState;

/// Assigns the nearest assignable driver to a pending trip and records the
/// dispatch notice. Wraps the actual matching so every outcome lands in the
/// metrics with one label.
pub fn assign_nearest_driver(state: &AppState, trip_id: Uuid) -> Result<(Trip, f64), AppError> {
    let start = Instant::now();
    let result = match_and_assign(state, trip_id);

    let outcome = match &result {
        Ok(_) => "success",
        Err(AppError::AssignmentRaceLost(_)) => "race_lost",
        Err(AppError::NoDriversAvailable) => "no_drivers",
        Err(AppError::NoLocatedDrivers) => "no_location",
        Err(_) => "rejected",
    };

    state
        .metrics
        .assignment_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .assignments_total
        .with_label_values(&[outcome])
        .inc();

    result
}

fn match_and_assign(state: &AppState, trip_id: Uuid) -> Result<(Trip, f64), AppError> {
    // Read guard is dropped before any map iteration below.
    let origin = {
        let trip = state
            .trips
            .get(&trip_id)
            .ok_or(AppError::TripNotFound(trip_id))?;
        if trip.status != TripStatus::Pending {
            return Err(AppError::TripNotPending(trip_id));
        }
        trip.origin
    };

    let candidates: Vec<Driver> = state
        .drivers
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|driver| lifecycle::is_assignable(state, driver))
        .collect();

    if candidates.is_empty() {
        return Err(AppError::NoDriversAvailable);
    }

    // Nearest by haversine; equal distances resolve to the lowest driver id
    // so repeated runs over the same snapshot pick the same driver.
    let (driver_id, distance_km) = candidates
        .iter()
        .filter_map(|driver| {
            driver
                .location
                .map(|location| (driver.id, haversine_km(&location, &origin)))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .ok_or(AppError::NoLocatedDrivers)?;

    // Both losing outcomes mean another matcher committed first, either on
    // this trip or on the chosen driver; the caller retries against a fresh
    // candidate set.
    let trip = lifecycle::assign_trip(state, trip_id, driver_id).map_err(|err| match err {
        AppError::AlreadyAssigned(_) | AppError::DriverNotAssignable(_) => {
            AppError::AssignmentRaceLost(trip_id)
        }
        other => other,
    })?;

    let notice = DispatchNotice {
        id: Uuid::new_v4(),
        trip_id,
        driver_id,
        distance_km,
        created_at: Utc::now(),
    };
    state.dispatches.insert(notice.id, notice.clone());
    let _ = state.dispatch_events_tx.send(notice);

    info!(
        trip_id = %trip_id,
        driver_id = %driver_id,
        distance_km,
        "nearest driver assigned"
    );

    Ok((trip, distance_km))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use super::assign_nearest_driver;
    use crate::engine::lifecycle::create_trip;
    use crate::error::AppError;
    use crate::models::driver::{Driver, GeoPoint};
    use crate::models::trip::TripStatus;
    use crate::state::AppState;

    fn state() -> AppState {
        AppState::new(Default::default(), 16)
    }

    fn add_driver(state: &AppState, id_seed: u128, location: Option<GeoPoint>) -> Uuid {
        let driver = Driver {
            id: Uuid::from_u128(id_seed),
            name: format!("driver-{id_seed}"),
            approved: true,
            location,
            updated_at: Utc::now(),
        };
        let id = driver.id;
        state.drivers.insert(id, driver);
        id
    }

    fn pending_trip_at_origin(state: &AppState) -> Uuid {
        create_trip(
            state,
            Uuid::new_v4(),
            GeoPoint { lat: 0.0, lng: 0.0 },
            GeoPoint { lat: 0.0, lng: 1.0 },
        )
        .unwrap()
        .id
    }

    // ~1 degree of longitude at the equator is ~111.19 km.
    fn point_at_km_east(km: f64) -> GeoPoint {
        GeoPoint {
            lat: 0.0,
            lng: km / 111.19,
        }
    }

    #[test]
    fn unknown_trip_is_reported() {
        let state = state();
        let result = assign_nearest_driver(&state, Uuid::new_v4());
        assert!(matches!(result, Err(AppError::TripNotFound(_))));
    }

    #[test]
    fn non_pending_trip_is_rejected() {
        let state = state();
        let trip_id = pending_trip_at_origin(&state);
        add_driver(&state, 1, Some(GeoPoint { lat: 0.0, lng: 0.0 }));

        assign_nearest_driver(&state, trip_id).unwrap();
        let result = assign_nearest_driver(&state, trip_id);
        assert!(matches!(result, Err(AppError::TripNotPending(_))));
    }

    #[test]
    fn empty_candidate_set_is_reported() {
        let state = state();
        let trip_id = pending_trip_at_origin(&state);
        let result = assign_nearest_driver(&state, trip_id);
        assert!(matches!(result, Err(AppError::NoDriversAvailable)));
    }

    #[test]
    fn unapproved_drivers_are_not_candidates() {
        let state = state();
        let trip_id = pending_trip_at_origin(&state);
        let driver_id = add_driver(&state, 1, Some(GeoPoint { lat: 0.0, lng: 0.0 }));
        state.drivers.get_mut(&driver_id).unwrap().approved = false;

        let result = assign_nearest_driver(&state, trip_id);
        assert!(matches!(result, Err(AppError::NoDriversAvailable)));
    }

    #[test]
    fn candidates_without_location_are_reported() {
        let state = state();
        let trip_id = pending_trip_at_origin(&state);
        add_driver(&state, 1, None);
        add_driver(&state, 2, None);

        let result = assign_nearest_driver(&state, trip_id);
        assert!(matches!(result, Err(AppError::NoLocatedDrivers)));
    }

    #[test]
    fn nearest_driver_wins() {
        let state = state();
        let trip_id = pending_trip_at_origin(&state);
        add_driver(&state, 1, Some(point_at_km_east(5.0)));
        let nearest = add_driver(&state, 2, Some(point_at_km_east(2.0)));
        add_driver(&state, 3, Some(point_at_km_east(8.0)));

        let (trip, distance_km) = assign_nearest_driver(&state, trip_id).unwrap();
        assert_eq!(trip.driver_id, Some(nearest));
        assert_eq!(trip.status, TripStatus::Assigned);
        assert!((distance_km - 2.0).abs() < 0.05);
    }

    #[test]
    fn equal_distance_resolves_to_lowest_id() {
        let state = state();
        let trip_id = pending_trip_at_origin(&state);
        let same_spot = point_at_km_east(3.0);
        add_driver(&state, 7, Some(same_spot));
        let lower = add_driver(&state, 3, Some(same_spot));

        let (trip, _) = assign_nearest_driver(&state, trip_id).unwrap();
        assert_eq!(trip.driver_id, Some(lower));
    }

    #[test]
    fn driver_without_location_is_skipped_when_others_are_located() {
        let state = state();
        let trip_id = pending_trip_at_origin(&state);
        add_driver(&state, 1, None);
        let located = add_driver(&state, 2, Some(point_at_km_east(10.0)));

        let (trip, _) = assign_nearest_driver(&state, trip_id).unwrap();
        assert_eq!(trip.driver_id, Some(located));
    }

    #[test]
    fn dispatch_records_a_notice() {
        let state = state();
        let trip_id = pending_trip_at_origin(&state);
        let driver_id = add_driver(&state, 1, Some(point_at_km_east(2.0)));

        assign_nearest_driver(&state, trip_id).unwrap();

        let notices: Vec<_> = state.dispatches.iter().map(|entry| entry.clone()).collect();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].trip_id, trip_id);
        assert_eq!(notices[0].driver_id, driver_id);
        assert!(notices[0].distance_km > 0.0);
    }

    #[test]
    fn concurrent_dispatches_have_exactly_one_winner() {
        let state = Arc::new(state());
        let trip_id = pending_trip_at_origin(&state);
        for seed in 1..=4 {
            add_driver(&state, seed, Some(point_at_km_east(seed as f64)));
        }

        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    assign_nearest_driver(&state, trip_id)
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        let winners = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(winners, 1);

        for result in &results {
            if let Err(err) = result {
                assert!(
                    matches!(
                        err,
                        AppError::AssignmentRaceLost(_) | AppError::TripNotPending(_)
                    ),
                    "unexpected loser error: {err}"
                );
            }
        }

        let trip = state.trips.get(&trip_id).unwrap().clone();
        assert_eq!(trip.status, TripStatus::Assigned);
        assert!(trip.driver_id.is_some());
    }
}
