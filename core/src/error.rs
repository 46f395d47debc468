//! Error taxonomy for core operations.
//!
//! All variants except [`CoreError::Store`] are caller mistakes: the HTTP
//! layer surfaces them as 4xx responses with the kind and a human message.
//! None are retried by the core itself.

use crate::store::StoreError;
use crate::types::MovieId;
use thiserror::Error;

/// Errors produced by session transitions, rating admission, and code
/// allocation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The submitted access code does not exist
    #[error("unknown access code")]
    InvalidCode,

    /// The movie id does not reference an existing movie
    #[error("movie {0} not found")]
    MovieNotFound(MovieId),

    /// This code has already rated this movie
    ///
    /// Raised either by the fast-path ledger check or, authoritatively, by
    /// the store's `(movie_id, code)` uniqueness constraint at insert time.
    #[error("code has already rated movie {movie_id}")]
    AlreadyRated {
        /// The movie the duplicate submission targeted
        movie_id: MovieId,
    },

    /// The rating value is out of range or not a half-star step
    #[error("rating value {0} must be between 0.5 and 5.0 in steps of 0.5")]
    InvalidRatingValue(f64),

    /// A session state machine precondition was not met
    #[error("invalid session transition: {0}")]
    InvalidTransition(&'static str),

    /// No rating session is currently open for this movie
    #[error("no rating session is open for movie {0}")]
    RatingClosed(MovieId),

    /// The code allocator exceeded its retry budget
    #[error("code space exhausted after {attempts} attempts for a single code")]
    CodeSpaceExhausted {
        /// How many draws were attempted before giving up
        attempts: u32,
    },

    /// The aggregate store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_movie() {
        let err = CoreError::MovieNotFound(MovieId::new(7));
        assert_eq!(err.to_string(), "movie 7 not found");

        let err = CoreError::AlreadyRated {
            movie_id: MovieId::new(3),
        };
        assert_eq!(err.to_string(), "code has already rated movie 3");
    }

    #[test]
    fn store_errors_pass_through() {
        let err = CoreError::from(StoreError::Database("connection reset".into()));
        assert_eq!(err.to_string(), "database error: connection reset");
    }
}
