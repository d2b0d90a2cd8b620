use crate::geo::haversine_km;
use crate::models::driver::GeoPoint;

pub const DEFAULT_BASE_FARE: f64 = 3000.0;
pub const DEFAULT_PER_KM_RATE: f64 = 1200.0;

/// Fare constants in the currency's whole-unit representation. Loaded from
/// config at startup; quotes taken under one schedule are persisted on the
/// trip, so later schedule changes never rewrite history.
#[derive(Debug, Clone, Copy)]
pub struct FareSchedule {
    pub base_fare: f64,
    pub per_km_rate: f64,
}

impl Default for FareSchedule {
    fn default() -> Self {
        Self {
            base_fare: DEFAULT_BASE_FARE,
            per_km_rate: DEFAULT_PER_KM_RATE,
        }
    }
}

impl FareSchedule {
    pub fn quote(&self, origin: &GeoPoint, destination: &GeoPoint) -> f64 {
        let distance_km = haversine_km(origin, destination);
        round2(self.base_fare + distance_km * self.per_km_rate)
    }
}

fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
