//! Movie endpoints.
//!
//! - `POST /api/movies`: create a movie
//! - `GET /api/movies`: list all movies
//! - `GET /api/movies/current`: the movie currently on screen, if any

use crate::error::AppError;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use cinerate_core::{CoreError, Movie, MovieId};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a movie.
#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    /// Display title
    pub title: String,
}

/// One movie as reported over HTTP.
#[derive(Debug, Serialize, Deserialize)]
pub struct MovieResponse {
    /// Stable identifier
    pub id: MovieId,
    /// Display title
    pub title: String,
    /// Whether this movie is currently on screen
    pub is_current: bool,
}

impl From<Movie> for MovieResponse {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            is_current: movie.is_current,
        }
    }
}

/// Response for listing movies.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListMoviesResponse {
    /// All movies, ordered by id
    pub movies: Vec<MovieResponse>,
}

/// Response for the current-movie query.
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentMovieResponse {
    /// The current movie, or `null` when the session is idle
    pub movie: Option<MovieResponse>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new movie.
///
/// # Errors
///
/// Returns a validation error for an empty title, 500 on storage failure.
pub async fn create_movie(
    State(state): State<AppState>,
    Json(request): Json<CreateMovieRequest>,
) -> Result<(StatusCode, Json<MovieResponse>), AppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Movie title must not be empty"));
    }

    let movie = state
        .store
        .create_movie(title)
        .await
        .map_err(CoreError::from)?;

    Ok((StatusCode::CREATED, Json(movie.into())))
}

/// List all movies.
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn list_movies(
    State(state): State<AppState>,
) -> Result<Json<ListMoviesResponse>, AppError> {
    let movies = state
        .store
        .list_movies()
        .await
        .map_err(CoreError::from)?;

    Ok(Json(ListMoviesResponse {
        movies: movies.into_iter().map(Into::into).collect(),
    }))
}

/// Get the movie currently on screen, if any.
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn current_movie(
    State(state): State<AppState>,
) -> Result<Json<CurrentMovieResponse>, AppError> {
    let movie = state
        .store
        .current_movie()
        .await
        .map_err(CoreError::from)?;

    Ok(Json(CurrentMovieResponse {
        movie: movie.map(Into::into),
    }))
}
