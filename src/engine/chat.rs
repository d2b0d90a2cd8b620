use std::sync::atomic::Ordering;

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::chat::ChatMessage;
use crate::state::AppState;

/// Appends an immutable message to a trip's log. The per-trip entry guard
/// makes the append order well-defined under concurrent posters.
pub fn post_message(
    state: &AppState,
    trip_id: Uuid,
    sender_id: Uuid,
    text: &str,
) -> Result<ChatMessage, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::EmptyMessage);
    }
    if !state.trips.contains_key(&trip_id) {
        return Err(AppError::TripNotFound(trip_id));
    }

    let message = ChatMessage {
        id: Uuid::new_v4(),
        seq: state.chat_seq.fetch_add(1, Ordering::Relaxed),
        trip_id,
        sender_id,
        text: text.to_string(),
        sent_at: Utc::now(),
    };

    state
        .chat_logs
        .entry(trip_id)
        .or_default()
        .push(message.clone());

    Ok(message)
}

/// A trip's messages, ascending by timestamp with `seq` breaking ties.
pub fn history(state: &AppState, trip_id: Uuid) -> Result<Vec<ChatMessage>, AppError> {
    if !state.trips.contains_key(&trip_id) {
        return Err(AppError::TripNotFound(trip_id));
    }

    let mut messages = state
        .chat_logs
        .get(&trip_id)
        .map(|log| log.clone())
        .unwrap_or_default();
    messages.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then(a.seq.cmp(&b.seq)));
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{history, post_message};
    use crate::engine::lifecycle::create_trip;
    use crate::error::AppError;
    use crate::models::driver::GeoPoint;
    use crate::state::AppState;

    fn state_with_trip() -> (AppState, Uuid) {
        let state = AppState::new(Default::default(), 16);
        let trip = create_trip(
            &state,
            Uuid::new_v4(),
            GeoPoint { lat: 0.0, lng: 0.0 },
            GeoPoint { lat: 0.0, lng: 1.0 },
        )
        .unwrap();
        let trip_id = trip.id;
        (state, trip_id)
    }

    #[test]
    fn blank_text_is_rejected() {
        let (state, trip_id) = state_with_trip();
        let sender = Uuid::new_v4();
        assert!(matches!(
            post_message(&state, trip_id, sender, ""),
            Err(AppError::EmptyMessage)
        ));
        assert!(matches!(
            post_message(&state, trip_id, sender, "   \n"),
            Err(AppError::EmptyMessage)
        ));
    }

    #[test]
    fn unknown_trip_is_rejected() {
        let state = AppState::new(Default::default(), 16);
        let result = post_message(&state, Uuid::new_v4(), Uuid::new_v4(), "hello");
        assert!(matches!(result, Err(AppError::TripNotFound(_))));
        assert!(matches!(
            history(&state, Uuid::new_v4()),
            Err(AppError::TripNotFound(_))
        ));
    }

    #[test]
    fn history_preserves_posting_order() {
        let (state, trip_id) = state_with_trip();
        let sender = Uuid::new_v4();

        post_message(&state, trip_id, sender, "first").unwrap();
        post_message(&state, trip_id, sender, "second").unwrap();
        post_message(&state, trip_id, sender, "third").unwrap();

        let texts: Vec<_> = history(&state, trip_id)
            .unwrap()
            .into_iter()
            .map(|message| message.text)
            .collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn seq_breaks_equal_timestamp_ties() {
        let (state, trip_id) = state_with_trip();
        let sender = Uuid::new_v4();

        let first = post_message(&state, trip_id, sender, "a").unwrap();
        let second = post_message(&state, trip_id, sender, "b").unwrap();
        assert!(first.seq < second.seq);

        // Force identical timestamps; order must still hold via seq.
        let shared = first.sent_at;
        {
            let mut log = state.chat_logs.get_mut(&trip_id).unwrap();
            for message in log.iter_mut() {
                message.sent_at = shared;
            }
            log.reverse();
        }

        let texts: Vec<_> = history(&state, trip_id)
            .unwrap()
            .into_iter()
            .map(|message| message.text)
            .collect();
        assert_eq!(texts, ["a", "b"]);
    }

    #[test]
    fn logs_are_scoped_per_trip() {
        let (state, first_trip) = state_with_trip();
        let second_trip = create_trip(
            &state,
            Uuid::new_v4(),
            GeoPoint { lat: 1.0, lng: 1.0 },
            GeoPoint { lat: 1.0, lng: 2.0 },
        )
        .unwrap()
        .id;
        let sender = Uuid::new_v4();

        post_message(&state, first_trip, sender, "for the first trip").unwrap();
        assert_eq!(history(&state, first_trip).unwrap().len(), 1);
        assert!(history(&state, second_trip).unwrap().is_empty());
    }
}
