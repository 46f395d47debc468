//! # CineRate Core
//!
//! Session coordination and real-time fan-out for a live movie-rating event.
//!
//! An operator selects a film, opens a timed rating window, and anonymous
//! attendees (identified by short access codes) each submit one star-rating
//! per movie while watching aggregate results update live.
//!
//! ## Core Concepts
//!
//! - **Session state machine**: the single global screening state
//!   (`Idle` → `Selected` → `RatingOpen`), owned by [`session::SessionCoordinator`]
//!   behind one serialization point
//! - **Admission**: a given access code may rate a given movie at most once,
//!   enforced authoritatively by the store's `(movie_id, code)` uniqueness
//!   constraint, see [`admission::AdmissionController`]
//! - **Fan-out**: best-effort broadcast of [`event::SessionEvent`]s to all
//!   connected viewers, no history, no replay; late joiners reconcile by
//!   reading a snapshot
//! - **Code allocation**: collision-free generation of short uppercase
//!   alphanumeric access codes via [`codes::CodeAllocator`]
//!
//! The store behind all of this is abstracted as [`store::RatingStore`];
//! production uses PostgreSQL (`cinerate-postgres`), tests use an in-memory
//! implementation (`cinerate-testing`).

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

/// Rating admission controller: validate and record viewer submissions
pub mod admission;

/// Fan-out broadcaster for session events
pub mod broadcast;

/// Access code allocation
pub mod codes;

/// Error taxonomy for core operations
pub mod error;

/// Session event schema broadcast to viewers
pub mod event;

/// The global screening-session state machine
pub mod session;

/// Aggregate store abstraction and its error type
pub mod store;

/// Domain types: movies, access codes, ratings
pub mod types;

pub use admission::AdmissionController;
pub use broadcast::EventBroadcaster;
pub use codes::{CodeAllocator, CodeConfig};
pub use error::CoreError;
pub use event::SessionEvent;
pub use session::{SessionCoordinator, SessionPhase, SessionSnapshot, SessionState};
pub use store::{RatingStore, StoreError};
pub use types::{AccessCode, Movie, MovieAverage, MovieId, Rating, RatingId, RatingValue};
