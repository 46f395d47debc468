//! `PostgreSQL`-backed implementation of the rating store.
//!
//! # Overview
//!
//! [`PostgresRatingStore`] is the production system of record for movies,
//! access codes, and ratings. Two guarantees live in the database rather than
//! in application state:
//!
//! - `set_current_movie` flips the `is_current` flag inside one transaction,
//!   so at most one movie is ever flagged current.
//! - `insert_rating` relies on the `UNIQUE (movie_id, code)` constraint; a
//!   violation is reported as [`StoreError::DuplicateRating`] and resolves
//!   concurrent duplicate submissions deterministically.
//!
//! All aggregate queries (averages, counts, statistics) are computed by
//! `PostgreSQL` so every value reflects committed state.
//!
//! # Example
//!
//! ```ignore
//! use cinerate_postgres::PostgresRatingStore;
//!
//! let store = PostgresRatingStore::new("postgres://localhost/cinerate").await?;
//! store.migrate().await?;
//! let movie = store.create_movie("The General").await?;
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cinerate_core::store::{RatingStore, StoreError};
use cinerate_core::types::{
    AccessCode, Movie, MovieAverage, MovieId, Rating, RatingId, RatingValue, StoreStatistics,
};
use sqlx::postgres::{PgPool, PgPoolOptions};

/// `PostgreSQL`-backed rating store.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct PostgresRatingStore {
    pool: PgPool,
}

impl PostgresRatingStore {
    /// Connect to the database and create a store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the connection fails.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Create a store around an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    ///
    /// Useful for custom queries or transactions.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// Creates the `movies`, `access_codes`, and `ratings` tables if they do
    /// not already exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

/// Rebuild a [`Rating`] from its row parts.
///
/// Stored values were validated on insert, so a failed re-validation means
/// the row was tampered with outside the application.
fn rating_from_row(
    id: i64,
    movie_id: i64,
    code: String,
    value: f64,
    created_at: DateTime<Utc>,
) -> Result<Rating, StoreError> {
    let value = RatingValue::try_new(value)
        .map_err(|_| StoreError::Database(format!("Stored rating value {value} is invalid")))?;

    Ok(Rating {
        id: RatingId::new(id),
        movie_id: MovieId::new(movie_id),
        value,
        code,
        created_at,
    })
}

#[async_trait]
impl RatingStore for PostgresRatingStore {
    async fn create_movie(&self, title: &str) -> Result<Movie, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO movies (title) VALUES ($1) RETURNING id",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to create movie: {e}")))?;

        Ok(Movie {
            id: MovieId::new(id),
            title: title.to_string(),
            is_current: false,
        })
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, StoreError> {
        let rows: Vec<(i64, String, bool)> = sqlx::query_as(
            "SELECT id, title, is_current FROM movies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to list movies: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(id, title, is_current)| Movie {
                id: MovieId::new(id),
                title,
                is_current,
            })
            .collect())
    }

    async fn find_movie(&self, id: MovieId) -> Result<Option<Movie>, StoreError> {
        let row: Option<(i64, String, bool)> = sqlx::query_as(
            "SELECT id, title, is_current FROM movies WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to find movie: {e}")))?;

        Ok(row.map(|(id, title, is_current)| Movie {
            id: MovieId::new(id),
            title,
            is_current,
        }))
    }

    async fn current_movie(&self) -> Result<Option<Movie>, StoreError> {
        let row: Option<(i64, String, bool)> = sqlx::query_as(
            "SELECT id, title, is_current FROM movies WHERE is_current",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to get current movie: {e}")))?;

        Ok(row.map(|(id, title, is_current)| Movie {
            id: MovieId::new(id),
            title,
            is_current,
        }))
    }

    async fn set_current_movie(&self, id: Option<MovieId>) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query("UPDATE movies SET is_current = FALSE WHERE is_current")
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to clear current movie: {e}")))?;

        if let Some(id) = id {
            let result = sqlx::query("UPDATE movies SET is_current = TRUE WHERE id = $1")
                .bind(id.get())
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Database(format!("Failed to set current movie: {e}")))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::Database(format!("Movie {id} does not exist")));
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to commit transaction: {e}")))?;

        Ok(())
    }

    async fn insert_code(&self, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO access_codes (code) VALUES ($1) ON CONFLICT (code) DO NOTHING",
        )
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to insert code: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_access_code(&self, code: &str) -> Result<Option<AccessCode>, StoreError> {
        let row: Option<(bool,)> = sqlx::query_as(
            "SELECT is_admin FROM access_codes WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to find access code: {e}")))?;

        let Some((is_admin,)) = row else {
            return Ok(None);
        };

        let rated: Vec<(i64,)> = sqlx::query_as(
            "SELECT movie_id FROM ratings WHERE code = $1 ORDER BY movie_id",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to load rated movies: {e}")))?;

        Ok(Some(AccessCode {
            code: code.to_string(),
            rated_movies: rated.into_iter().map(|(id,)| MovieId::new(id)).collect(),
            is_admin,
        }))
    }

    async fn list_codes(&self) -> Result<Vec<AccessCode>, StoreError> {
        let codes: Vec<(String, bool)> = sqlx::query_as(
            "SELECT code, is_admin FROM access_codes ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to list codes: {e}")))?;

        let rated: Vec<(String, i64)> = sqlx::query_as(
            "SELECT code, movie_id FROM ratings ORDER BY code, movie_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to load rated movies: {e}")))?;

        let mut by_code: BTreeMap<String, Vec<MovieId>> = BTreeMap::new();
        for (code, movie_id) in rated {
            by_code.entry(code).or_default().push(MovieId::new(movie_id));
        }

        Ok(codes
            .into_iter()
            .map(|(code, is_admin)| {
                let rated_movies = by_code.remove(&code).unwrap_or_default();
                AccessCode {
                    code,
                    rated_movies,
                    is_admin,
                }
            })
            .collect())
    }

    async fn has_rated(&self, code: &str, movie_id: MovieId) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM ratings WHERE code = $1 AND movie_id = $2)",
        )
        .bind(code)
        .bind(movie_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to check rating: {e}")))?;

        Ok(exists)
    }

    async fn insert_rating(
        &self,
        movie_id: MovieId,
        code: &str,
        value: RatingValue,
    ) -> Result<Rating, StoreError> {
        let row: (i64, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO ratings (movie_id, code, value)
             VALUES ($1, $2, $3)
             RETURNING id, created_at",
        )
        .bind(movie_id.get())
        .bind(code)
        .bind(value.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // The unique constraint is the authoritative duplicate check
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return StoreError::DuplicateRating {
                        movie_id,
                        code: code.to_string(),
                    };
                }
            }
            StoreError::Database(format!("Failed to insert rating: {e}"))
        })?;

        rating_from_row(row.0, movie_id.get(), code.to_string(), value.get(), row.1)
    }

    async fn movie_average(&self, movie_id: MovieId) -> Result<f64, StoreError> {
        let (average,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(AVG(value), 0.0) FROM ratings WHERE movie_id = $1",
        )
        .bind(movie_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to compute average: {e}")))?;

        Ok(average)
    }

    async fn movie_rating_count(&self, movie_id: MovieId) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM ratings WHERE movie_id = $1",
        )
        .bind(movie_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to count ratings: {e}")))?;

        Ok(count)
    }

    async fn all_averages(&self) -> Result<Vec<MovieAverage>, StoreError> {
        let rows: Vec<(i64, f64)> = sqlx::query_as(
            "SELECT movie_id, AVG(value) FROM ratings GROUP BY movie_id ORDER BY movie_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to compute averages: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(movie_id, average)| MovieAverage {
                movie_id: MovieId::new(movie_id),
                average,
            })
            .collect())
    }

    async fn clear_ratings(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM ratings")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to clear ratings: {e}")))?;

        Ok(())
    }

    async fn statistics(&self) -> Result<StoreStatistics, StoreError> {
        let (total_movies, total_codes, total_ratings, codes_used): (i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT
                    (SELECT COUNT(*) FROM movies),
                    (SELECT COUNT(*) FROM access_codes),
                    (SELECT COUNT(*) FROM ratings),
                    (SELECT COUNT(DISTINCT code) FROM ratings)",
            )
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to load statistics: {e}")))?;

        Ok(StoreStatistics {
            total_movies,
            total_codes,
            total_ratings,
            codes_used,
        })
    }
}
