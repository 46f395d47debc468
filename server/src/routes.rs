//! Router configuration for the CineRate server.
//!
//! Builds the complete Axum router with all endpoints.

use crate::api::{admin, codes, health, movies, ratings, status, websocket};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Build the complete Axum router.
///
/// Route groups:
/// - Health check (no state reads)
/// - Viewer endpoints: movies, ratings, status, `/ws` fan-out
/// - Operator endpoints under `/api/admin`: session transitions, aggregate
///   reads, ratings clear
/// - Code administration under `/api/codes`
///
/// # Arguments
///
/// - `state`: Application state to share with handlers
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Reconciliation read for late-joining viewers
        .route("/status", get(status::get_status))
        // Movies
        .route("/movies", post(movies::create_movie))
        .route("/movies", get(movies::list_movies))
        .route("/movies/current", get(movies::current_movie))
        // Ratings
        .route("/ratings/:movie_id", post(ratings::submit_rating))
        .route("/ratings/:movie_id/count", get(ratings::rating_count))
        .route("/ratings/:movie_id/has-rated", get(ratings::has_rated))
        // Access codes
        .route("/codes/generate", post(codes::generate_codes))
        .route("/codes", get(codes::list_codes))
        .route("/codes/:code/rated-movies", get(codes::rated_movies))
        // Operator controls
        .route("/admin/select-movie/:movie_id", post(admin::select_movie))
        .route("/admin/start-rating-session", post(admin::start_rating))
        .route("/admin/idle", post(admin::set_idle))
        .route("/admin/averages", get(admin::averages))
        .route("/admin/statistics", get(admin::statistics))
        .route("/admin/ratings/clear", post(admin::clear_ratings));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ws", get(websocket::handle))
        .nest("/api", api_routes)
        .with_state(state)
}
