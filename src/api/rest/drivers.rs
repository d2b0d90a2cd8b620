use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo;
use crate::models::driver::{Driver, GeoPoint};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id/location", patch(update_driver_location))
        .route("/drivers/:id/approval", patch(update_driver_approval))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub location: Option<GeoPoint>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
pub struct UpdateApprovalRequest {
    pub approved: bool,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if let Some(location) = &payload.location {
        geo::validate(location)?;
    }

    // Approval is a manual step; new drivers start out unassignable.
    let driver = Driver {
        id: Uuid::new_v4(),
        name: payload.name,
        approved: false,
        location: payload.location,
        updated_at: Utc::now(),
    };

    state.drivers.insert(driver.id, driver.clone());
    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    let drivers = state.drivers.iter().map(|entry| entry.clone()).collect();
    Json(drivers)
}

async fn update_driver_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Driver>, AppError> {
    let location = GeoPoint {
        lat: payload.lat,
        lng: payload.lng,
    };
    geo::validate(&location)?;

    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or(AppError::DriverNotFound(id))?;

    driver.location = Some(location);
    driver.updated_at = Utc::now();

    Ok(Json(driver.clone()))
}

async fn update_driver_approval(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApprovalRequest>,
) -> Result<Json<Driver>, AppError> {
    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or(AppError::DriverNotFound(id))?;

    driver.approved = payload.approved;
    driver.updated_at = Utc::now();

    Ok(Json(driver.clone()))
}
