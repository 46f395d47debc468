//! Rating submission and query endpoints.
//!
//! - `POST /api/ratings/:movie_id`: submit one rating
//! - `GET /api/ratings/:movie_id/count`: admitted rating count
//! - `GET /api/ratings/:movie_id/has-rated?code=…`: admission ledger query

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use cinerate_core::{MovieId, Rating, RatingId};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to submit a rating.
#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    /// The submitting access code
    pub code: String,
    /// Star value, half-star steps in `[0.5, 5.0]`
    pub value: f64,
}

/// An admitted rating.
#[derive(Debug, Serialize, Deserialize)]
pub struct RatingResponse {
    /// Store-assigned identifier
    pub id: RatingId,
    /// The rated movie
    pub movie_id: MovieId,
    /// Star value
    pub value: f64,
    /// The submitting access code
    pub code: String,
    /// When the rating was recorded
    pub created_at: DateTime<Utc>,
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id,
            movie_id: rating.movie_id,
            value: rating.value.get(),
            code: rating.code,
            created_at: rating.created_at,
        }
    }
}

/// Response for the rating-count query.
#[derive(Debug, Serialize, Deserialize)]
pub struct RatingCountResponse {
    /// The movie
    pub movie_id: MovieId,
    /// Number of admitted ratings
    pub rating_count: i64,
}

/// Query parameters for the has-rated check.
#[derive(Debug, Deserialize)]
pub struct HasRatedQuery {
    /// The access code to check
    pub code: String,
}

/// Response for the has-rated check.
#[derive(Debug, Serialize, Deserialize)]
pub struct HasRatedResponse {
    /// The checked code
    pub code: String,
    /// The movie
    pub movie_id: MovieId,
    /// Whether this code already rated this movie
    pub has_rated: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit one rating for a movie.
///
/// On success the rating is persisted and `ratingUpdate` /
/// `ratingCountUpdate` reach every connected viewer.
///
/// # Errors
///
/// - 400 `INVALID_CODE`: unknown access code
/// - 404 `MOVIE_NOT_FOUND`: unknown movie
/// - 409 `RATING_CLOSED`: no rating session open for this movie
/// - 409 `ALREADY_RATED`: this code already rated this movie
/// - 422 `INVALID_RATING_VALUE`: out of range or off-step value
pub async fn submit_rating(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Json(request): Json<SubmitRatingRequest>,
) -> Result<(StatusCode, Json<RatingResponse>), AppError> {
    let rating = state
        .admission
        .submit_rating(&request.code, MovieId::new(movie_id), request.value)
        .await?;

    Ok((StatusCode::CREATED, Json(rating.into())))
}

/// Get the number of admitted ratings for a movie.
///
/// # Errors
///
/// Returns 404 for an unknown movie, 500 on storage failure.
pub async fn rating_count(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<RatingCountResponse>, AppError> {
    let movie_id = MovieId::new(movie_id);
    let rating_count = state.admission.rating_count(movie_id).await?;

    Ok(Json(RatingCountResponse {
        movie_id,
        rating_count,
    }))
}

/// Check whether a code has already rated a movie.
///
/// # Errors
///
/// Returns 400 for an unknown code, 500 on storage failure.
pub async fn has_rated(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Query(query): Query<HasRatedQuery>,
) -> Result<Json<HasRatedResponse>, AppError> {
    let movie_id = MovieId::new(movie_id);
    let has_rated = state.admission.has_rated(&query.code, movie_id).await?;

    Ok(Json(HasRatedResponse {
        code: query.code,
        movie_id,
        has_rated,
    }))
}
