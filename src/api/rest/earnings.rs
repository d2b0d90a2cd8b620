use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::ledger;
use crate::error::AppError;
use crate::models::earning::{EarningCategory, EarningsRecord};
use crate::models::promotion::Promotion;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/promotions", post(create_promotion).get(list_promotions))
        .route("/promotions/:id/award", post(award_promotion))
        .route("/earnings/:user_id", get(get_earnings))
}

#[derive(Deserialize)]
pub struct CreatePromotionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub bonus_amount: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct AwardPromotionRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct EarningsQuery {
    pub category: Option<EarningCategory>,
}

#[derive(Serialize)]
pub struct EarningsResponse {
    pub user_id: Uuid,
    pub total: f64,
    pub records: Vec<EarningsRecord>,
}

async fn create_promotion(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePromotionRequest>,
) -> Result<Json<Promotion>, AppError> {
    let promotion = Promotion {
        id: Uuid::new_v4(),
        name: payload.name,
        description: payload.description,
        bonus_amount: payload.bonus_amount,
        starts_at: payload.starts_at,
        ends_at: payload.ends_at,
    };

    state.promotions.insert(promotion.id, promotion.clone());
    Ok(Json(promotion))
}

async fn list_promotions(State(state): State<Arc<AppState>>) -> Json<Vec<Promotion>> {
    let promotions = state.promotions.iter().map(|entry| entry.clone()).collect();
    Json(promotions)
}

async fn award_promotion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AwardPromotionRequest>,
) -> Result<Json<EarningsRecord>, AppError> {
    let record = ledger::credit_promotion(&state, payload.user_id, id)?;
    Ok(Json(record))
}

async fn get_earnings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<EarningsQuery>,
) -> Json<EarningsResponse> {
    Json(EarningsResponse {
        user_id,
        total: ledger::total_for(&state, user_id, query.category),
        records: ledger::records_for(&state, user_id, query.category),
    })
}
