//! Health check endpoint.
//!
//! Used by load balancers and monitoring systems to verify the service is
//! running.

use axum::http::StatusCode;

/// Simple health check endpoint (liveness).
///
/// Returns 200 OK to indicate the service is running. This endpoint does
/// NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)] // Axum handler signature requires async
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
