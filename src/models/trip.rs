use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// Legal `advance` edges. `Assigned` is deliberately absent as a target:
    /// a trip only becomes `Assigned` through the matcher, which also sets
    /// the driver.
    pub fn can_advance_to(self, next: TripStatus) -> bool {
        matches!(
            (self, next),
            (TripStatus::Pending, TripStatus::Cancelled)
                | (TripStatus::Assigned, TripStatus::InProgress)
                | (TripStatus::Assigned, TripStatus::Cancelled)
                | (TripStatus::InProgress, TripStatus::Completed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    /// Computed once when the trip is created and persisted, so historical
    /// fares stay stable if the fare schedule changes later.
    pub fare: Option<f64>,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
