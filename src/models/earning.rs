use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarningCategory {
    Referral,
    Promotion,
    Trip,
    Other,
}

/// Immutable credit entry. Never updated or deleted after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub category: EarningCategory,
    pub trip_id: Option<Uuid>,
    pub promotion_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
