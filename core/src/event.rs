//! Session events fanned out to connected viewers.
//!
//! # Wire Format
//!
//! Events serialize as adjacently tagged JSON, matching what viewer clients
//! consume:
//!
//! ```json
//! {"event":"movieSelected","payload":{"movieId":7}}
//! {"event":"ratingUpdate","payload":{"movieId":7,"average":4.0}}
//! {"event":"idle","payload":{}}
//! ```
//!
//! Delivery is best-effort and unordered relative to a racing second
//! transition; no history is retained. A viewer that connects after an event
//! was emitted reconciles by reading the session snapshot instead.

use crate::types::MovieId;
use serde::{Deserialize, Serialize};

/// A state transition or aggregate update pushed to every connected viewer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum SessionEvent {
    /// The operator selected a movie (rating not yet open)
    #[serde(rename_all = "camelCase")]
    MovieSelected {
        /// The newly current movie
        movie_id: MovieId,
    },

    /// The operator opened the rating window for the current movie
    #[serde(rename_all = "camelCase")]
    StartRatingSession {
        /// The movie ratings are being collected for
        movie_id: MovieId,
    },

    /// The operator returned the event to idle
    Idle {},

    /// A rating was admitted; the movie's average changed
    #[serde(rename_all = "camelCase")]
    RatingUpdate {
        /// The rated movie
        movie_id: MovieId,
        /// Average over all admitted ratings, computed after the triggering
        /// rating was committed
        average: f64,
    },

    /// A rating was admitted; the movie's rating count changed
    #[serde(rename_all = "camelCase")]
    RatingCountUpdate {
        /// The rated movie
        movie_id: MovieId,
        /// Number of admitted ratings
        rating_count: i64,
    },

    /// All ratings were administratively cleared
    RatingClear {},
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn movie_selected_wire_format() {
        let event = SessionEvent::MovieSelected {
            movie_id: MovieId::new(7),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"movieSelected","payload":{"movieId":7}}"#);
    }

    #[test]
    fn start_rating_session_wire_format() {
        let event = SessionEvent::StartRatingSession {
            movie_id: MovieId::new(7),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"startRatingSession","payload":{"movieId":7}}"#
        );
    }

    #[test]
    fn idle_has_empty_payload() {
        let json = serde_json::to_string(&SessionEvent::Idle {}).unwrap();
        assert_eq!(json, r#"{"event":"idle","payload":{}}"#);
    }

    #[test]
    fn rating_update_wire_format() {
        let event = SessionEvent::RatingUpdate {
            movie_id: MovieId::new(7),
            average: 4.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"ratingUpdate","payload":{"movieId":7,"average":4.0}}"#
        );
    }

    #[test]
    fn rating_count_update_wire_format() {
        let event = SessionEvent::RatingCountUpdate {
            movie_id: MovieId::new(7),
            rating_count: 1,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"ratingCountUpdate","payload":{"movieId":7,"ratingCount":1}}"#
        );
    }

    #[test]
    fn events_round_trip() {
        let event = SessionEvent::RatingClear {};
        let json = serde_json::to_string(&event).unwrap();
        let parsed: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
