use std::sync::atomic::AtomicU64;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::engine::fare::FareSchedule;
use crate::models::chat::ChatMessage;
use crate::models::dispatch::DispatchNotice;
use crate::models::driver::Driver;
use crate::models::earning::EarningsRecord;
use crate::models::promotion::Promotion;
use crate::models::trip::Trip;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub trips: DashMap<Uuid, Trip>,
    pub drivers: DashMap<Uuid, Driver>,
    pub promotions: DashMap<Uuid, Promotion>,
    pub earnings: DashMap<Uuid, EarningsRecord>,
    /// (user, promotion) -> earnings record id. Entry access on this map is
    /// what makes promotion awards idempotent under concurrency.
    pub promotion_awards: DashMap<(Uuid, Uuid), Uuid>,
    pub chat_logs: DashMap<Uuid, Vec<ChatMessage>>,
    pub dispatches: DashMap<Uuid, DispatchNotice>,
    pub dispatch_events_tx: broadcast::Sender<DispatchNotice>,
    pub chat_seq: AtomicU64,
    pub fares: FareSchedule,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(fares: FareSchedule, event_buffer_size: usize) -> Self {
        let (dispatch_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            trips: DashMap::new(),
            drivers: DashMap::new(),
            promotions: DashMap::new(),
            earnings: DashMap::new(),
            promotion_awards: DashMap::new(),
            chat_logs: DashMap::new(),
            dispatches: DashMap::new(),
            dispatch_events_tx,
            chat_seq: AtomicU64::new(0),
            fares,
            metrics: Metrics::new(),
        }
    }
}
