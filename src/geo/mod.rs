use crate::error::AppError;
use crate::models::driver::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance between two points. Inputs must be validated
/// coordinates; non-finite values propagate as NaN.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Rejects non-finite or out-of-range coordinates. A legitimate 0.0 on either
/// axis is valid; presence is decided by `Option`, never by truthiness.
pub fn validate(point: &GeoPoint) -> Result<(), AppError> {
    let lat_ok = point.lat.is_finite() && (-90.0..=90.0).contains(&point.lat);
    let lng_ok = point.lng.is_finite() && (-180.0..=180.0).contains(&point.lng);

    if lat_ok && lng_ok {
        Ok(())
    } else {
        Err(AppError::InvalidCoordinates)
    }
}
