//! Operator endpoints: session transitions and aggregate reads.
//!
//! - `POST /api/admin/select-movie/:movie_id`: put a movie on screen
//! - `POST /api/admin/start-rating-session`: open the rating window
//! - `POST /api/admin/idle`: return to idle
//! - `GET /api/admin/averages`: per-movie averages
//! - `GET /api/admin/statistics`: event-wide totals
//! - `POST /api/admin/ratings/clear`: delete all ratings

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use cinerate_core::{CoreError, MovieId, SessionSnapshot};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response after a session transition: the resulting snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransitionResponse {
    /// The session state after the transition
    pub session: SessionSnapshot,
}

/// One movie's average rating.
#[derive(Debug, Serialize, Deserialize)]
pub struct MovieAverageResponse {
    /// The movie
    pub movie_id: MovieId,
    /// Mean of all submitted values
    pub average: f64,
}

/// Response for the averages query.
#[derive(Debug, Serialize, Deserialize)]
pub struct AveragesResponse {
    /// Averages for every movie with at least one rating
    pub averages: Vec<MovieAverageResponse>,
}

/// Event-wide totals for the operator statistics view.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatisticsResponse {
    /// Number of movies created
    pub total_movies: i64,
    /// Number of access codes allocated
    pub total_codes: i64,
    /// Number of ratings submitted
    pub total_ratings: i64,
    /// Number of distinct codes that have rated at least one movie
    pub codes_used: i64,
    /// `codes_used / total_codes`, 0.0 when no codes exist
    pub participation_rate: f64,
}

/// Response after clearing all ratings.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearRatingsResponse {
    /// Confirmation message
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Select the movie to show next.
///
/// Closes any open rating window, flips the `is_current` flag in the store,
/// and broadcasts `movieSelected`.
///
/// # Errors
///
/// Returns 404 `MOVIE_NOT_FOUND` for an unknown movie.
pub async fn select_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<TransitionResponse>, AppError> {
    state.session.select_movie(MovieId::new(movie_id)).await?;
    Ok(Json(TransitionResponse {
        session: state.session.snapshot().await,
    }))
}

/// Open the rating window for the currently selected movie.
///
/// Re-opening an open window is allowed and re-emits `startRatingSession`.
///
/// # Errors
///
/// Returns 409 `INVALID_TRANSITION` when no movie is selected.
pub async fn start_rating(
    State(state): State<AppState>,
) -> Result<Json<TransitionResponse>, AppError> {
    state.session.start_rating().await?;
    Ok(Json(TransitionResponse {
        session: state.session.snapshot().await,
    }))
}

/// Return the event to idle.
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn set_idle(
    State(state): State<AppState>,
) -> Result<Json<TransitionResponse>, AppError> {
    state.session.set_idle().await?;
    Ok(Json(TransitionResponse {
        session: state.session.snapshot().await,
    }))
}

/// Per-movie averages for all movies with at least one rating.
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn averages(State(state): State<AppState>) -> Result<Json<AveragesResponse>, AppError> {
    let averages = state.store.all_averages().await.map_err(CoreError::from)?;

    Ok(Json(AveragesResponse {
        averages: averages
            .into_iter()
            .map(|a| MovieAverageResponse {
                movie_id: a.movie_id,
                average: a.average,
            })
            .collect(),
    }))
}

/// Event-wide totals and participation rate.
///
/// # Errors
///
/// Returns 500 on storage failure.
#[allow(clippy::cast_precision_loss)] // Counts are far below 2^52
pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<StatisticsResponse>, AppError> {
    let stats = state.store.statistics().await.map_err(CoreError::from)?;

    let participation_rate = if stats.total_codes > 0 {
        stats.codes_used as f64 / stats.total_codes as f64
    } else {
        0.0
    };

    Ok(Json(StatisticsResponse {
        total_movies: stats.total_movies,
        total_codes: stats.total_codes,
        total_ratings: stats.total_ratings,
        codes_used: stats.codes_used,
        participation_rate,
    }))
}

/// Delete all ratings and broadcast `ratingClear`.
///
/// Leaves the session state untouched: returning to idle is the separate
/// `POST /api/admin/idle`.
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn clear_ratings(
    State(state): State<AppState>,
) -> Result<Json<ClearRatingsResponse>, AppError> {
    state.admission.clear_ratings().await?;
    Ok(Json(ClearRatingsResponse {
        message: "All ratings cleared".to_string(),
    }))
}
