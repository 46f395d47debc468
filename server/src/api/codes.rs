//! Access code administration endpoints.
//!
//! - `POST /api/codes/generate`: allocate a batch of new codes
//! - `GET /api/codes`: list all codes with their rated-movie sets
//! - `GET /api/codes/:code/rated-movies`: movies a code has rated

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use cinerate_core::{AccessCode, CoreError, MovieId};
use serde::{Deserialize, Serialize};

/// Largest accepted batch size for one generate call.
const MAX_BATCH: usize = 1000;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to generate a batch of access codes.
#[derive(Debug, Deserialize)]
pub struct GenerateCodesRequest {
    /// How many codes to allocate
    pub count: usize,
}

/// Response with the freshly allocated codes.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateCodesResponse {
    /// The new codes, in allocation order
    pub codes: Vec<String>,
}

/// One access code with its rated-movie set.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessCodeResponse {
    /// The code string
    pub code: String,
    /// Ids of the movies this code has rated
    pub rated_movies: Vec<MovieId>,
    /// Whether the code grants operator access
    pub is_admin: bool,
}

impl From<AccessCode> for AccessCodeResponse {
    fn from(code: AccessCode) -> Self {
        Self {
            code: code.code,
            rated_movies: code.rated_movies,
            is_admin: code.is_admin,
        }
    }
}

/// Response for listing codes.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListCodesResponse {
    /// All access codes
    pub codes: Vec<AccessCodeResponse>,
    /// Total number of codes
    pub total: usize,
    /// Number of codes that have rated at least one movie
    pub used: usize,
}

/// Response for a code's rated-movies query.
#[derive(Debug, Serialize, Deserialize)]
pub struct RatedMoviesResponse {
    /// The queried code
    pub code: String,
    /// Ids of the movies it has rated
    pub movie_ids: Vec<MovieId>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Allocate a batch of new access codes.
///
/// Codes already inserted are kept if the batch fails partway; operators
/// can retry for the remainder.
///
/// # Errors
///
/// - 422 `VALIDATION_ERROR`: count is zero or above the batch cap
/// - 422 `CODE_SPACE_EXHAUSTED`: retry cap exceeded
pub async fn generate_codes(
    State(state): State<AppState>,
    Json(request): Json<GenerateCodesRequest>,
) -> Result<(StatusCode, Json<GenerateCodesResponse>), AppError> {
    if request.count == 0 || request.count > MAX_BATCH {
        return Err(AppError::validation(format!(
            "count must be between 1 and {MAX_BATCH}"
        )));
    }

    let codes = state.allocator.generate(request.count).await?;
    Ok((StatusCode::CREATED, Json(GenerateCodesResponse { codes })))
}

/// List all access codes with their rated-movie sets.
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn list_codes(
    State(state): State<AppState>,
) -> Result<Json<ListCodesResponse>, AppError> {
    let codes = state.store.list_codes().await.map_err(CoreError::from)?;

    let total = codes.len();
    let used = codes.iter().filter(|c| !c.rated_movies.is_empty()).count();

    Ok(Json(ListCodesResponse {
        codes: codes.into_iter().map(Into::into).collect(),
        total,
        used,
    }))
}

/// Get the movies a code has rated.
///
/// # Errors
///
/// Returns 404 for an unknown code, 500 on storage failure.
pub async fn rated_movies(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RatedMoviesResponse>, AppError> {
    let access_code = state
        .store
        .find_access_code(&code)
        .await
        .map_err(CoreError::from)?
        .ok_or_else(|| AppError::not_found("Access code", &code))?;

    Ok(Json(RatedMoviesResponse {
        code: access_code.code,
        movie_ids: access_code.rated_movies,
    }))
}
