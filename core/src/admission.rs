//! Rating admission: validate and record viewer submissions.
//!
//! The admission rule is one rating per access code per movie. The check and
//! the commit behave as a single atomic step: the ledger query
//! ([`RatingStore::has_rated`]) is only a fast path for the common duplicate
//! case, while the store's `(movie_id, code)` uniqueness constraint is the
//! authority: a constraint violation at insert time is converted into a
//! deterministic [`CoreError::AlreadyRated`], never surfaced as a storage
//! fault. Submissions for different `(code, movie)` pairs proceed fully in
//! parallel.

use crate::broadcast::EventBroadcaster;
use crate::error::CoreError;
use crate::event::SessionEvent;
use crate::session::SessionCoordinator;
use crate::store::{RatingStore, StoreError};
use crate::types::{MovieId, Rating, RatingValue};
use std::sync::Arc;
use tracing::{debug, info};

/// Validates rating submissions against the session state machine and the
/// admission ledger, persists them, and triggers the aggregate broadcasts.
///
/// Cheap to clone; all clones share the same store and session.
#[derive(Clone)]
pub struct AdmissionController {
    store: Arc<dyn RatingStore>,
    session: Arc<SessionCoordinator>,
    broadcaster: EventBroadcaster,
}

impl AdmissionController {
    /// Create an admission controller.
    #[must_use]
    pub fn new(
        store: Arc<dyn RatingStore>,
        session: Arc<SessionCoordinator>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            store,
            session,
            broadcaster,
        }
    }

    /// Admit one rating submission.
    ///
    /// On success the rating is persisted, the movie's average and count are
    /// recomputed from committed state, and `ratingUpdate` plus
    /// `ratingCountUpdate` are broadcast to all connected viewers.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidCode`]: the access code does not exist
    /// - [`CoreError::MovieNotFound`]: the movie id does not exist
    /// - [`CoreError::RatingClosed`]: no rating session is open for this movie
    /// - [`CoreError::AlreadyRated`]: this code already rated this movie
    /// - [`CoreError::InvalidRatingValue`]: out of range or off-step value
    /// - [`CoreError::Store`]: storage failure
    pub async fn submit_rating(
        &self,
        code: &str,
        movie_id: MovieId,
        value: f64,
    ) -> Result<Rating, CoreError> {
        self.store
            .find_access_code(code)
            .await?
            .ok_or(CoreError::InvalidCode)?;
        self.store
            .find_movie(movie_id)
            .await?
            .ok_or(CoreError::MovieNotFound(movie_id))?;

        if !self.session.is_rating_open_for(movie_id).await {
            return Err(CoreError::RatingClosed(movie_id));
        }

        // Fast path only: the insert below is the authoritative check.
        if self.store.has_rated(code, movie_id).await? {
            return Err(CoreError::AlreadyRated { movie_id });
        }

        let value = RatingValue::try_new(value)?;

        let rating = match self.store.insert_rating(movie_id, code, value).await {
            Ok(rating) => rating,
            Err(StoreError::DuplicateRating { movie_id, .. }) => {
                debug!(%movie_id, "concurrent duplicate submission lost the race");
                return Err(CoreError::AlreadyRated { movie_id });
            }
            Err(err) => return Err(err.into()),
        };

        let average = self.store.movie_average(movie_id).await?;
        let rating_count = self.store.movie_rating_count(movie_id).await?;

        info!(%movie_id, %value, average, rating_count, "rating admitted");
        self.broadcaster
            .broadcast(&SessionEvent::RatingUpdate { movie_id, average });
        self.broadcaster.broadcast(&SessionEvent::RatingCountUpdate {
            movie_id,
            rating_count,
        });

        Ok(rating)
    }

    /// Whether `code` has already rated `movie_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCode`] for an unknown code,
    /// [`CoreError::Store`] on storage failure.
    pub async fn has_rated(&self, code: &str, movie_id: MovieId) -> Result<bool, CoreError> {
        self.store
            .find_access_code(code)
            .await?
            .ok_or(CoreError::InvalidCode)?;
        Ok(self.store.has_rated(code, movie_id).await?)
    }

    /// Number of admitted ratings for one movie.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MovieNotFound`] for an unknown movie,
    /// [`CoreError::Store`] on storage failure.
    pub async fn rating_count(&self, movie_id: MovieId) -> Result<i64, CoreError> {
        self.store
            .find_movie(movie_id)
            .await?
            .ok_or(CoreError::MovieNotFound(movie_id))?;
        Ok(self.store.movie_rating_count(movie_id).await?)
    }

    /// Delete all ratings and broadcast `ratingClear`.
    ///
    /// Deliberately leaves the session state untouched: returning to idle is
    /// a separate, explicit operator action.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on storage failure.
    pub async fn clear_ratings(&self) -> Result<(), CoreError> {
        self.store.clear_ratings().await?;
        info!("all ratings cleared");
        self.broadcaster.broadcast(&SessionEvent::RatingClear {});
        Ok(())
    }
}
