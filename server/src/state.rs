//! Application state for the CineRate HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers: the aggregate
//! store, the session coordinator, the admission controller, the code
//! allocator, and the fan-out broadcaster.

use cinerate_core::{
    AdmissionController, CodeAllocator, CodeConfig, EventBroadcaster, SessionCoordinator,
    store::RatingStore,
};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request. Every component sees the
/// same store and the same broadcast channel, so an admission triggered
/// over HTTP reaches every WebSocket viewer.
#[derive(Clone)]
pub struct AppState {
    /// The aggregate store (Postgres in production, in-memory in tests)
    pub store: Arc<dyn RatingStore>,

    /// Single-writer owner of the session state machine
    pub session: Arc<SessionCoordinator>,

    /// Rating admission pipeline
    pub admission: AdmissionController,

    /// Access code allocator
    pub allocator: Arc<CodeAllocator>,

    /// Fan-out channel; WebSocket handlers subscribe here
    pub broadcaster: EventBroadcaster,
}

impl AppState {
    /// Wire the full component graph over one store.
    ///
    /// # Arguments
    ///
    /// - `store`: The aggregate store implementation
    /// - `codes`: Access code allocation parameters
    /// - `broadcast_capacity`: Fan-out channel capacity; lagged viewers
    ///   drop the oldest events past this bound
    #[must_use]
    pub fn new(store: Arc<dyn RatingStore>, codes: CodeConfig, broadcast_capacity: usize) -> Self {
        let broadcaster = EventBroadcaster::new(broadcast_capacity);
        let session = Arc::new(SessionCoordinator::new(store.clone(), broadcaster.clone()));
        let admission =
            AdmissionController::new(store.clone(), session.clone(), broadcaster.clone());
        let allocator = Arc::new(CodeAllocator::new(store.clone(), codes));

        Self {
            store,
            session,
            admission,
            allocator,
            broadcaster,
        }
    }
}
