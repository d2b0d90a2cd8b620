use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::trip::TripStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("coordinates out of range")]
    InvalidCoordinates,

    #[error("message text is empty")]
    EmptyMessage,

    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: TripStatus, to: TripStatus },

    #[error("trip {0} not found")]
    TripNotFound(Uuid),

    #[error("driver {0} not found")]
    DriverNotFound(Uuid),

    #[error("promotion {0} not found")]
    PromotionNotFound(Uuid),

    #[error("trip {0} is not pending")]
    TripNotPending(Uuid),

    #[error("trip {0} already has a driver")]
    AlreadyAssigned(Uuid),

    #[error("driver {0} is not assignable")]
    DriverNotAssignable(Uuid),

    #[error("no drivers available")]
    NoDriversAvailable,

    #[error("no available driver has a known location")]
    NoLocatedDrivers,

    #[error("lost assignment race for trip {0}")]
    AssignmentRaceLost(Uuid),

    #[error("promotion {0} is not currently active")]
    PromotionNotActive(Uuid),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidCoordinates | AppError::EmptyMessage => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. }
            | AppError::TripNotPending(_)
            | AppError::AlreadyAssigned(_)
            | AppError::DriverNotAssignable(_)
            | AppError::AssignmentRaceLost(_)
            | AppError::PromotionNotActive(_) => StatusCode::CONFLICT,
            AppError::TripNotFound(_)
            | AppError::DriverNotFound(_)
            | AppError::PromotionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::NoDriversAvailable | AppError::NoLocatedDrivers => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
