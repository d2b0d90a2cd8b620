use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record that a driver should be notified about an assignment. Delivery is
/// someone else's job; the engine only keeps the record and broadcasts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchNotice {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub driver_id: Uuid,
    pub distance_km: f64,
    pub created_at: DateTime<Utc>,
}
