//! Domain types for the CineRate screening system.
//!
//! Value objects and entities shared by the session state machine, the
//! admission controller, and the store implementations.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a movie.
///
/// Assigned by the store (`BIGSERIAL` in PostgreSQL); stable for the lifetime
/// of the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(i64);

impl MovieId {
    /// Create a `MovieId` from a raw id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingId(i64);

impl RatingId {
    /// Create a `RatingId` from a raw id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RatingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A film shown during the screening event.
///
/// Mutated only through the `is_current` flag flip; never deleted in normal
/// operation. At most one movie is current at any instant, an invariant
/// owned by the session state machine, not by the storage layer alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    /// Stable identifier
    pub id: MovieId,
    /// Display title
    pub title: String,
    /// Whether this movie is the one currently on screen
    pub is_current: bool,
}

/// An attendee's access code.
///
/// Not a user account: a short unique string over an uppercase alphanumeric
/// alphabet, handed out before the event. `rated_movies` is a set: never two
/// entries for the same movie id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCode {
    /// The code string itself (unique, fixed length)
    pub code: String,
    /// Ids of the movies this code has already rated
    pub rated_movies: Vec<MovieId>,
    /// Whether the code grants operator access
    pub is_admin: bool,
}

/// A single star-rating submitted by one access code for one movie.
///
/// Immutable once created. For any two ratings, `(movie_id, code)` never
/// repeats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Store-assigned identifier
    pub id: RatingId,
    /// The rated movie
    pub movie_id: MovieId,
    /// Star value
    pub value: RatingValue,
    /// The submitting access code
    pub code: String,
    /// When the rating was recorded
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Rating value
// ============================================================================

/// A star-rating on the discrete scale 0.5..=5.0 in half-star steps.
///
/// Construction validates range and step, so a `RatingValue` is valid by
/// construction everywhere downstream.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingValue(f64);

impl RatingValue {
    /// Smallest accepted value.
    pub const MIN: f64 = 0.5;
    /// Largest accepted value.
    pub const MAX: f64 = 5.0;

    /// Validate a raw value into a `RatingValue`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRatingValue`] if `value` is outside
    /// `[0.5, 5.0]` or not a multiple of 0.5.
    pub fn try_new(value: f64) -> Result<Self, CoreError> {
        let half_steps = value * 2.0;
        if half_steps.fract() != 0.0 || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(CoreError::InvalidRatingValue(value));
        }
        Ok(Self(value))
    }

    /// Get the value as a float.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for RatingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// Average rating for one movie, as reported by the operator averages query.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieAverage {
    /// The movie
    pub movie_id: MovieId,
    /// Mean of all submitted values (0.0 when the movie has no ratings)
    pub average: f64,
}

/// Event-wide totals used by the operator statistics view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatistics {
    /// Number of movies created
    pub total_movies: i64,
    /// Number of access codes allocated
    pub total_codes: i64,
    /// Number of ratings submitted
    pub total_ratings: i64,
    /// Number of distinct codes that have rated at least one movie
    pub codes_used: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn half_star_steps_accepted() {
        for raw in [0.5, 1.0, 2.5, 3.5, 4.5, 5.0] {
            let value = RatingValue::try_new(raw);
            assert!(value.is_ok(), "expected {raw} to be accepted");
        }
    }

    #[test]
    fn off_step_values_rejected() {
        for raw in [0.3, 4.25, 3.999] {
            assert!(matches!(
                RatingValue::try_new(raw),
                Err(CoreError::InvalidRatingValue(_))
            ));
        }
    }

    #[test]
    fn out_of_range_values_rejected() {
        for raw in [0.0, -1.0, 5.5, 100.0] {
            assert!(matches!(
                RatingValue::try_new(raw),
                Err(CoreError::InvalidRatingValue(_))
            ));
        }
    }

    #[test]
    fn scale_bounds_are_the_accepted_extremes() {
        assert!(RatingValue::try_new(RatingValue::MIN).is_ok());
        assert!(RatingValue::try_new(RatingValue::MAX).is_ok());
        assert!(RatingValue::try_new(RatingValue::MIN - 0.5).is_err());
        assert!(RatingValue::try_new(RatingValue::MAX + 0.5).is_err());
    }

    #[test]
    fn rating_value_displays_one_decimal() {
        let value = RatingValue::try_new(4.0).unwrap();
        assert_eq!(value.to_string(), "4.0");
    }

    #[test]
    fn movie_id_serializes_transparently() {
        let json = serde_json::to_string(&MovieId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
