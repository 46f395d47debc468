//! Reconciliation read for late-joining viewers.
//!
//! Fan-out is best-effort with no history; `GET /api/status` is the
//! authoritative snapshot a client reads after connecting or after missing
//! events.

use crate::api::movies::MovieResponse;
use crate::error::AppError;
use crate::state::AppState;
use axum::{Json, extract::State};
use cinerate_core::{CoreError, SessionPhase};
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of the whole event.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// The observable session phase
    pub phase: SessionPhase,
    /// The movie currently on screen, if any
    pub current_movie: Option<MovieResponse>,
    /// Whether the rating window is open
    pub rating_open: bool,
    /// Average for the current movie (absent when idle)
    pub average: Option<f64>,
    /// Rating count for the current movie (absent when idle)
    pub rating_count: Option<i64>,
}

/// Get a consistent snapshot of the session and the current movie's
/// aggregates.
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let snapshot = state.session.snapshot().await;

    let (current_movie, average, rating_count) = match snapshot.current_movie_id {
        Some(movie_id) => {
            let movie = state
                .store
                .find_movie(movie_id)
                .await
                .map_err(CoreError::from)?;
            let average = state
                .store
                .movie_average(movie_id)
                .await
                .map_err(CoreError::from)?;
            let count = state
                .store
                .movie_rating_count(movie_id)
                .await
                .map_err(CoreError::from)?;
            (movie.map(Into::into), Some(average), Some(count))
        }
        None => (None, None, None),
    };

    Ok(Json(StatusResponse {
        phase: snapshot.phase(),
        current_movie,
        rating_open: snapshot.rating_open,
        average,
        rating_count,
    }))
}
