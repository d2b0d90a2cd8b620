use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{chat, dispatch, lifecycle};
use crate::error::AppError;
use crate::models::chat::ChatMessage;
use crate::models::dispatch::DispatchNotice;
use crate::models::driver::GeoPoint;
use crate::models::trip::{Trip, TripStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trips", post(create_trip).get(list_trips))
        .route("/trips/:id", get(get_trip))
        .route("/trips/:id/assign", post(assign_trip))
        .route("/trips/:id/status", patch(update_trip_status))
        .route(
            "/trips/:id/messages",
            post(post_chat_message).get(list_chat_messages),
        )
        .route("/dispatches", get(list_dispatches))
}

#[derive(Deserialize)]
pub struct CreateTripRequest {
    pub passenger_id: Uuid,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}

#[derive(Deserialize)]
pub struct UpdateTripStatusRequest {
    pub status: TripStatus,
}

#[derive(Deserialize)]
pub struct PostChatMessageRequest {
    pub sender_id: Uuid,
    pub text: String,
}

#[derive(Serialize)]
pub struct AssignResponse {
    pub trip: Trip,
    pub distance_km: f64,
}

async fn create_trip(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTripRequest>,
) -> Result<Json<Trip>, AppError> {
    let trip = lifecycle::create_trip(
        &state,
        payload.passenger_id,
        payload.origin,
        payload.destination,
    )?;
    Ok(Json(trip))
}

async fn list_trips(State(state): State<Arc<AppState>>) -> Json<Vec<Trip>> {
    let trips = state.trips.iter().map(|entry| entry.clone()).collect();
    Json(trips)
}

async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    let trip = state
        .trips
        .get(&id)
        .map(|entry| entry.clone())
        .ok_or(AppError::TripNotFound(id))?;
    Ok(Json(trip))
}

async fn assign_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssignResponse>, AppError> {
    let (trip, distance_km) = dispatch::assign_nearest_driver(&state, id)?;
    Ok(Json(AssignResponse { trip, distance_km }))
}

async fn update_trip_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTripStatusRequest>,
) -> Result<Json<Trip>, AppError> {
    let trip = lifecycle::advance_trip(&state, id, payload.status)?;
    Ok(Json(trip))
}

async fn post_chat_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostChatMessageRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    let message = chat::post_message(&state, id, payload.sender_id, &payload.text)?;
    Ok(Json(message))
}

async fn list_chat_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let messages = chat::history(&state, id)?;
    Ok(Json(messages))
}

async fn list_dispatches(State(state): State<Arc<AppState>>) -> Json<Vec<DispatchNotice>> {
    let notices = state.dispatches.iter().map(|entry| entry.clone()).collect();
    Json(notices)
}
