//! # CineRate Testing
//!
//! Testing utilities for the CineRate workspace.
//!
//! Provides [`InMemoryRatingStore`], a complete in-process implementation of
//! the [`RatingStore`] trait with the same atomicity guarantees as the
//! PostgreSQL store: the `is_current` flip happens under one lock, and the
//! `(movie_id, code)` uniqueness check-and-insert is a single critical
//! section, so concurrent duplicate submissions resolve to exactly one
//! winner just like a database unique index.
//!
//! ## Example
//!
//! ```
//! use cinerate_testing::InMemoryRatingStore;
//! use cinerate_core::store::RatingStore;
//!
//! # async fn example() -> Result<(), cinerate_core::StoreError> {
//! let store = InMemoryRatingStore::new();
//! let _movie = store.create_movie("The General").await?;
//! assert!(store.insert_code("AB3X9Z").await?);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::Utc;
use cinerate_core::store::{RatingStore, StoreError};
use cinerate_core::types::{
    AccessCode, Movie, MovieAverage, MovieId, Rating, RatingId, RatingValue, StoreStatistics,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Internal mutable state, guarded by one mutex.
#[derive(Debug, Default)]
struct Inner {
    movies: BTreeMap<i64, Movie>,
    next_movie_id: i64,
    /// code -> is_admin
    codes: BTreeMap<String, bool>,
    ratings: Vec<Rating>,
    /// `(movie_id, code)` pairs with a rating, mirroring the unique index
    rated_pairs: BTreeSet<(i64, String)>,
    next_rating_id: i64,
}

/// In-memory [`RatingStore`] for unit and handler tests.
///
/// All operations lock one [`Mutex`], which trivially serializes the
/// check-and-commit paths the production store serializes with transactions
/// and a unique constraint.
#[derive(Debug, Default)]
pub struct InMemoryRatingStore {
    inner: Mutex<Inner>,
}

impl InMemoryRatingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Database("store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl RatingStore for InMemoryRatingStore {
    async fn create_movie(&self, title: &str) -> Result<Movie, StoreError> {
        let mut inner = self.lock()?;
        inner.next_movie_id += 1;
        let movie = Movie {
            id: MovieId::new(inner.next_movie_id),
            title: title.to_string(),
            is_current: false,
        };
        inner.movies.insert(movie.id.get(), movie.clone());
        Ok(movie)
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        Ok(self.lock()?.movies.values().cloned().collect())
    }

    async fn find_movie(&self, id: MovieId) -> Result<Option<Movie>, StoreError> {
        Ok(self.lock()?.movies.get(&id.get()).cloned())
    }

    async fn current_movie(&self) -> Result<Option<Movie>, StoreError> {
        Ok(self
            .lock()?
            .movies
            .values()
            .find(|movie| movie.is_current)
            .cloned())
    }

    async fn set_current_movie(&self, id: Option<MovieId>) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if let Some(id) = id {
            if !inner.movies.contains_key(&id.get()) {
                return Err(StoreError::Database(format!("movie {id} does not exist")));
            }
        }
        for movie in inner.movies.values_mut() {
            movie.is_current = Some(movie.id) == id;
        }
        Ok(())
    }

    async fn insert_code(&self, code: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        if inner.codes.contains_key(code) {
            return Ok(false);
        }
        inner.codes.insert(code.to_string(), false);
        Ok(true)
    }

    async fn find_access_code(&self, code: &str) -> Result<Option<AccessCode>, StoreError> {
        let inner = self.lock()?;
        let Some(&is_admin) = inner.codes.get(code) else {
            return Ok(None);
        };
        let rated_movies = inner
            .ratings
            .iter()
            .filter(|rating| rating.code == code)
            .map(|rating| rating.movie_id)
            .collect();
        Ok(Some(AccessCode {
            code: code.to_string(),
            rated_movies,
            is_admin,
        }))
    }

    async fn list_codes(&self) -> Result<Vec<AccessCode>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .codes
            .iter()
            .map(|(code, &is_admin)| AccessCode {
                code: code.clone(),
                rated_movies: inner
                    .ratings
                    .iter()
                    .filter(|rating| &rating.code == code)
                    .map(|rating| rating.movie_id)
                    .collect(),
                is_admin,
            })
            .collect())
    }

    async fn has_rated(&self, code: &str, movie_id: MovieId) -> Result<bool, StoreError> {
        Ok(self
            .lock()?
            .rated_pairs
            .contains(&(movie_id.get(), code.to_string())))
    }

    async fn insert_rating(
        &self,
        movie_id: MovieId,
        code: &str,
        value: RatingValue,
    ) -> Result<Rating, StoreError> {
        let mut inner = self.lock()?;

        // One critical section for check-and-insert, like the unique index.
        if !inner.rated_pairs.insert((movie_id.get(), code.to_string())) {
            return Err(StoreError::DuplicateRating {
                movie_id,
                code: code.to_string(),
            });
        }

        inner.next_rating_id += 1;
        let rating = Rating {
            id: RatingId::new(inner.next_rating_id),
            movie_id,
            value,
            code: code.to_string(),
            created_at: Utc::now(),
        };
        inner.ratings.push(rating.clone());
        Ok(rating)
    }

    async fn movie_average(&self, movie_id: MovieId) -> Result<f64, StoreError> {
        let inner = self.lock()?;
        let values: Vec<f64> = inner
            .ratings
            .iter()
            .filter(|rating| rating.movie_id == movie_id)
            .map(|rating| rating.value.get())
            .collect();
        if values.is_empty() {
            return Ok(0.0);
        }
        #[allow(clippy::cast_precision_loss)] // Rating counts stay tiny
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    #[allow(clippy::cast_possible_wrap)] // Counts fit i64
    async fn movie_rating_count(&self, movie_id: MovieId) -> Result<i64, StoreError> {
        let count = self
            .lock()?
            .ratings
            .iter()
            .filter(|rating| rating.movie_id == movie_id)
            .count();
        Ok(count as i64)
    }

    async fn all_averages(&self) -> Result<Vec<MovieAverage>, StoreError> {
        let inner = self.lock()?;
        let mut sums: BTreeMap<i64, (f64, i64)> = BTreeMap::new();
        for rating in &inner.ratings {
            let entry = sums.entry(rating.movie_id.get()).or_insert((0.0, 0));
            entry.0 += rating.value.get();
            entry.1 += 1;
        }
        #[allow(clippy::cast_precision_loss)] // Rating counts stay tiny
        Ok(sums
            .into_iter()
            .map(|(movie_id, (sum, count))| MovieAverage {
                movie_id: MovieId::new(movie_id),
                average: sum / count as f64,
            })
            .collect())
    }

    async fn clear_ratings(&self) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.ratings.clear();
        inner.rated_pairs.clear();
        Ok(())
    }

    #[allow(clippy::cast_possible_wrap)] // Counts fit i64
    async fn statistics(&self) -> Result<StoreStatistics, StoreError> {
        let inner = self.lock()?;
        let codes_used = inner
            .ratings
            .iter()
            .map(|rating| rating.code.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        Ok(StoreStatistics {
            total_movies: inner.movies.len() as i64,
            total_codes: inner.codes.len() as i64,
            total_ratings: inner.ratings.len() as i64,
            codes_used: codes_used as i64,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_rating_is_rejected() {
        let store = InMemoryRatingStore::new();
        let movie = store.create_movie("Metropolis").await.unwrap();
        store.insert_code("AB3X9Z").await.unwrap();

        let value = RatingValue::try_new(4.0).unwrap();
        store.insert_rating(movie.id, "AB3X9Z", value).await.unwrap();

        let err = store
            .insert_rating(movie.id, "AB3X9Z", value)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateRating { .. }));
        assert_eq!(store.movie_rating_count(movie.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn current_movie_flip_is_exclusive() {
        let store = InMemoryRatingStore::new();
        let first = store.create_movie("Nosferatu").await.unwrap();
        let second = store.create_movie("Sunrise").await.unwrap();

        store.set_current_movie(Some(first.id)).await.unwrap();
        store.set_current_movie(Some(second.id)).await.unwrap();

        let current: Vec<_> = store
            .list_movies()
            .await
            .unwrap()
            .into_iter()
            .filter(|movie| movie.is_current)
            .collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, second.id);

        store.set_current_movie(None).await.unwrap();
        assert!(store.current_movie().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_code_reports_collisions() {
        let store = InMemoryRatingStore::new();
        assert!(store.insert_code("AB3X9Z").await.unwrap());
        assert!(!store.insert_code("AB3X9Z").await.unwrap());
    }

    #[tokio::test]
    async fn average_is_zero_without_ratings() {
        let store = InMemoryRatingStore::new();
        let movie = store.create_movie("Safety Last!").await.unwrap();
        assert!((store.movie_average(movie.id).await.unwrap() - 0.0).abs() < f64::EPSILON);
    }
}
