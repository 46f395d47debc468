//! Aggregate store abstraction.
//!
//! The store is the system of record for movies, access codes, and ratings.
//! The core treats it as an external collaborator: everything here is
//! potentially blocking I/O, and the store is assumed to provide its own
//! transactional guarantees for the two write paths that matter:
//!
//! - [`RatingStore::set_current_movie`] clears and sets the `is_current`
//!   flag atomically (one transaction), so no interleaving can leave two
//!   movies current.
//! - [`RatingStore::insert_rating`] enforces uniqueness on
//!   `(movie_id, code)` and reports a violation as
//!   [`StoreError::DuplicateRating`], the authoritative `AlreadyRated`
//!   signal under concurrent submission.
//!
//! Implementations: `PostgresRatingStore` (production, `cinerate-postgres`)
//! and `InMemoryRatingStore` (tests, `cinerate-testing`).

use crate::types::{
    AccessCode, Movie, MovieAverage, MovieId, Rating, RatingValue, StoreStatistics,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by store implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The `(movie_id, code)` uniqueness constraint rejected an insert.
    ///
    /// Not an internal fault: the admission controller converts this into a
    /// deterministic `AlreadyRated`.
    #[error("rating for movie {movie_id} by code {code} already exists")]
    DuplicateRating {
        /// The movie the duplicate targeted
        movie_id: MovieId,
        /// The submitting code
        code: String,
    },

    /// Any other storage failure
    #[error("database error: {0}")]
    Database(String),
}

/// Persistent storage for movies, access codes, and ratings.
///
/// All aggregate queries (count, average) are computed by the store so that
/// every broadcast reports a value consistent with committed state.
#[async_trait]
pub trait RatingStore: Send + Sync {
    // ------------------------------------------------------------------
    // Movies
    // ------------------------------------------------------------------

    /// Create a movie with the given title.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn create_movie(&self, title: &str) -> Result<Movie, StoreError>;

    /// List all movies.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError>;

    /// Look up a movie by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn find_movie(&self, id: MovieId) -> Result<Option<Movie>, StoreError>;

    /// The movie currently flagged `is_current`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn current_movie(&self) -> Result<Option<Movie>, StoreError>;

    /// Flip the `is_current` flag: clear it on all movies and, when `id` is
    /// `Some`, set it for that movie in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn set_current_movie(&self, id: Option<MovieId>) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Access codes
    // ------------------------------------------------------------------

    /// Insert a freshly allocated code.
    ///
    /// Returns `false` without error if the code already exists; the
    /// allocator's collision signal, enforced by the store's primary key
    /// rather than a separate lookup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn insert_code(&self, code: &str) -> Result<bool, StoreError>;

    /// Look up an access code with its rated-movie set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn find_access_code(&self, code: &str) -> Result<Option<AccessCode>, StoreError>;

    /// List all access codes with their rated-movie sets.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn list_codes(&self) -> Result<Vec<AccessCode>, StoreError>;

    // ------------------------------------------------------------------
    // Ratings and the admission ledger
    // ------------------------------------------------------------------

    /// Whether `code` has already rated `movie_id`.
    ///
    /// This is the admission ledger query, a fast pre-check only; the
    /// uniqueness constraint in [`Self::insert_rating`] is authoritative.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn has_rated(&self, code: &str, movie_id: MovieId) -> Result<bool, StoreError>;

    /// Persist a rating.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateRating`] when `(movie_id, code)`
    /// already has a rating, [`StoreError::Database`] on other failures.
    async fn insert_rating(
        &self,
        movie_id: MovieId,
        code: &str,
        value: RatingValue,
    ) -> Result<Rating, StoreError>;

    /// Average rating for one movie; `0.0` when it has no ratings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn movie_average(&self, movie_id: MovieId) -> Result<f64, StoreError>;

    /// Number of admitted ratings for one movie.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn movie_rating_count(&self, movie_id: MovieId) -> Result<i64, StoreError>;

    /// Per-movie averages for all movies that have at least one rating.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn all_averages(&self) -> Result<Vec<MovieAverage>, StoreError>;

    /// Delete all ratings (administrative clear).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn clear_ratings(&self) -> Result<(), StoreError>;

    /// Event-wide totals for the operator statistics view.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn statistics(&self) -> Result<StoreStatistics, StoreError>;
}
