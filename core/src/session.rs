//! The global screening-session state machine.
//!
//! Exactly one session exists per process. Its state is three-valued:
//!
//! ```text
//!            select_movie(id)              start_rating()
//!   Idle ──────────────────────> Selected ───────────────> RatingOpen
//!    ^                              │  ^                       │ │
//!    │         set_idle()           │  └── select_movie(id) ───┘ │
//!    └──────────────────────────────┴────────────────────────────┘
//! ```
//!
//! `select_movie` is valid from any state (including `RatingOpen`, closing
//! the window for the previous movie); `start_rating` requires a selected
//! movie and is idempotent when the window is already open; `set_idle` is
//! valid from any state.
//!
//! [`SessionState`] is the pure transition logic; [`SessionCoordinator`]
//! owns one instance behind a single `RwLock` whose write region also covers
//! the store's `is_current` flag flip, so two racing `select_movie` calls
//! can never leave two movies marked current.

use crate::broadcast::EventBroadcaster;
use crate::error::CoreError;
use crate::event::SessionEvent;
use crate::store::RatingStore;
use crate::types::MovieId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

// ============================================================================
// Pure state machine
// ============================================================================

/// The three observable phases of the screening session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    /// No current movie, rating closed
    Idle,
    /// Current movie set, rating closed
    Selected,
    /// Current movie set, rating open
    RatingOpen,
}

/// The single global screening state: current movie plus rating-open flag.
///
/// Invariant: `rating_open` implies `current_movie` is set. Upheld by
/// construction: the only way to open the window is through
/// [`SessionState::start_rating`], which refuses without a selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    current_movie: Option<MovieId>,
    rating_open: bool,
}

impl SessionState {
    /// A fresh `Idle` state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current_movie: None,
            rating_open: false,
        }
    }

    /// Select a movie. Valid from any state; closes any open rating window.
    pub const fn select_movie(&mut self, movie_id: MovieId) -> SessionEvent {
        self.current_movie = Some(movie_id);
        self.rating_open = false;
        SessionEvent::MovieSelected { movie_id }
    }

    /// Open the rating window for the already-selected movie.
    ///
    /// Idempotent when the window is already open: state is unchanged and
    /// the same event is produced again.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] when no movie is selected.
    pub const fn start_rating(&mut self) -> Result<SessionEvent, CoreError> {
        match self.current_movie {
            Some(movie_id) => {
                self.rating_open = true;
                Ok(SessionEvent::StartRatingSession { movie_id })
            }
            None => Err(CoreError::InvalidTransition(
                "cannot start a rating session with no movie selected",
            )),
        }
    }

    /// Return to idle. Valid from any state; clears the current movie.
    pub const fn set_idle(&mut self) -> SessionEvent {
        self.current_movie = None;
        self.rating_open = false;
        SessionEvent::Idle {}
    }

    /// True only if the rating window is open for exactly this movie.
    #[must_use]
    pub const fn is_rating_open_for(&self, movie_id: MovieId) -> bool {
        self.rating_open
            && match self.current_movie {
                Some(current) => current.get() == movie_id.get(),
                None => false,
            }
    }

    /// The currently selected movie, if any.
    #[must_use]
    pub const fn current_movie(&self) -> Option<MovieId> {
        self.current_movie
    }

    /// Whether the rating window is open.
    #[must_use]
    pub const fn is_rating_open(&self) -> bool {
        self.rating_open
    }

    /// The observable phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        match (self.current_movie, self.rating_open) {
            (None, _) => SessionPhase::Idle,
            (Some(_), false) => SessionPhase::Selected,
            (Some(_), true) => SessionPhase::RatingOpen,
        }
    }
}

/// A consistent point-in-time copy of the session state, for reconciliation
/// reads by late-joining viewers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// The currently selected movie, if any
    pub current_movie_id: Option<MovieId>,
    /// Whether the rating window is open
    pub rating_open: bool,
}

impl SessionSnapshot {
    /// The observable phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        match (self.current_movie_id, self.rating_open) {
            (None, _) => SessionPhase::Idle,
            (Some(_), false) => SessionPhase::Selected,
            (Some(_), true) => SessionPhase::RatingOpen,
        }
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Single-writer owner of the global session state.
///
/// All operator transitions go through here. The write lock is held across
/// the in-memory transition *and* the store's `is_current` flip, making each
/// transition one serialized read-modify-write; the triggered broadcast is
/// emitted inside the same region so every event reports a state the emitter
/// actually observed.
pub struct SessionCoordinator {
    state: RwLock<SessionState>,
    store: Arc<dyn RatingStore>,
    broadcaster: EventBroadcaster,
}

impl SessionCoordinator {
    /// Create a coordinator in the `Idle` state.
    #[must_use]
    pub fn new(store: Arc<dyn RatingStore>, broadcaster: EventBroadcaster) -> Self {
        Self {
            state: RwLock::new(SessionState::new()),
            store,
            broadcaster,
        }
    }

    /// Select the movie to show next.
    ///
    /// Clears the `is_current` flag on all other movies and sets it for
    /// `movie_id`, then broadcasts `movieSelected`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MovieNotFound`] if the movie does not exist,
    /// [`CoreError::Store`] on storage failure.
    pub async fn select_movie(&self, movie_id: MovieId) -> Result<(), CoreError> {
        let mut state = self.state.write().await;

        self.store
            .find_movie(movie_id)
            .await?
            .ok_or(CoreError::MovieNotFound(movie_id))?;
        self.store.set_current_movie(Some(movie_id)).await?;

        let event = state.select_movie(movie_id);
        info!(%movie_id, "movie selected");
        self.broadcaster.broadcast(&event);
        Ok(())
    }

    /// Open the rating window for the currently selected movie.
    ///
    /// Idempotent re-open is allowed and re-emits `startRatingSession`
    /// without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] when no movie is selected.
    pub async fn start_rating(&self) -> Result<MovieId, CoreError> {
        let mut state = self.state.write().await;

        let event = state.start_rating()?;
        let SessionEvent::StartRatingSession { movie_id } = event else {
            // start_rating only ever produces StartRatingSession
            return Err(CoreError::InvalidTransition("unexpected transition event"));
        };
        info!(%movie_id, "rating session open");
        self.broadcaster.broadcast(&event);
        Ok(movie_id)
    }

    /// Return the event to idle: no current movie, rating closed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on storage failure.
    pub async fn set_idle(&self) -> Result<(), CoreError> {
        let mut state = self.state.write().await;

        self.store.set_current_movie(None).await?;

        let event = state.set_idle();
        info!("session idle");
        self.broadcaster.broadcast(&event);
        Ok(())
    }

    /// True only if the rating window is open for exactly this movie.
    pub async fn is_rating_open_for(&self, movie_id: MovieId) -> bool {
        self.state.read().await.is_rating_open_for(movie_id)
    }

    /// Whether any rating window is open.
    pub async fn is_rating_open(&self) -> bool {
        self.state.read().await.is_rating_open()
    }

    /// A consistent snapshot for reconciliation reads.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            current_movie_id: state.current_movie(),
            rating_open: state.is_rating_open(),
        }
    }
}
