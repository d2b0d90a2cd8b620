use chrono::Utc;
use dashmap::mapref::entry::Entry;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::earning::{EarningCategory, EarningsRecord};
use crate::models::trip::Trip;
use crate::state::AppState;

/// Awards a promotion bonus at most once per (user, promotion). The entry on
/// the award index is the atomic check-then-insert; concurrent awards for the
/// same pair serialize on it.
pub fn credit_promotion(
    state: &AppState,
    user_id: Uuid,
    promotion_id: Uuid,
) -> Result<EarningsRecord, AppError> {
    let promotion = state
        .promotions
        .get(&promotion_id)
        .map(|entry| entry.clone())
        .ok_or(AppError::PromotionNotFound(promotion_id))?;

    let now = Utc::now();
    if !promotion.is_active_at(now) {
        return Err(AppError::PromotionNotActive(promotion_id));
    }

    match state.promotion_awards.entry((user_id, promotion_id)) {
        Entry::Occupied(slot) => {
            let record_id = *slot.get();
            state
                .earnings
                .get(&record_id)
                .map(|entry| entry.clone())
                .ok_or_else(|| {
                    AppError::Internal(format!("award index points at missing record {record_id}"))
                })
        }
        Entry::Vacant(slot) => {
            let record = EarningsRecord {
                id: Uuid::new_v4(),
                user_id,
                amount: promotion.bonus_amount,
                category: EarningCategory::Promotion,
                trip_id: None,
                promotion_id: Some(promotion_id),
                created_at: now,
            };
            state.earnings.insert(record.id, record.clone());
            slot.insert(record.id);

            state
                .metrics
                .earnings_credited_total
                .with_label_values(&["promotion"])
                .inc();
            info!(
                user_id = %user_id,
                promotion_id = %promotion_id,
                amount = record.amount,
                "promotion bonus credited"
            );
            Ok(record)
        }
    }
}

/// Credits a completed trip's fare to its driver. Called by the state machine
/// when a trip enters `Completed`.
pub fn credit_trip(state: &AppState, driver_id: Uuid, trip: &Trip) -> EarningsRecord {
    let record = EarningsRecord {
        id: Uuid::new_v4(),
        user_id: driver_id,
        amount: trip.fare.unwrap_or_default(),
        category: EarningCategory::Trip,
        trip_id: Some(trip.id),
        promotion_id: None,
        created_at: Utc::now(),
    };
    state.earnings.insert(record.id, record.clone());

    state
        .metrics
        .earnings_credited_total
        .with_label_values(&["trip"])
        .inc();
    info!(
        driver_id = %driver_id,
        trip_id = %trip.id,
        amount = record.amount,
        "trip fare credited"
    );
    record
}

/// Read-only sum of a user's credits, optionally narrowed to one category.
pub fn total_for(state: &AppState, user_id: Uuid, category: Option<EarningCategory>) -> f64 {
    state
        .earnings
        .iter()
        .filter(|entry| {
            entry.user_id == user_id && category.is_none_or(|wanted| entry.category == wanted)
        })
        .map(|entry| entry.amount)
        .sum()
}

/// All of a user's records, newest last.
pub fn records_for(
    state: &AppState,
    user_id: Uuid,
    category: Option<EarningCategory>,
) -> Vec<EarningsRecord> {
    let mut records: Vec<EarningsRecord> = state
        .earnings
        .iter()
        .filter(|entry| {
            entry.user_id == user_id && category.is_none_or(|wanted| entry.category == wanted)
        })
        .map(|entry| entry.clone())
        .collect();
    records.sort_by_key(|record| record.created_at);
    records
}
