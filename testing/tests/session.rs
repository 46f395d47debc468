//! Integration tests for the session coordinator.
//!
//! Drives the coordinator against [`InMemoryRatingStore`] and asserts the
//! two things the state machine owns: at most one current movie, and the
//! broadcast stream matching every transition in order.

#![allow(clippy::unwrap_used)] // Test code can use unwrap

use std::sync::Arc;

use cinerate_core::{
    AdmissionController, CoreError, EventBroadcaster, SessionCoordinator, SessionEvent,
    SessionPhase,
};
use cinerate_core::store::RatingStore;
use cinerate_testing::InMemoryRatingStore;
use tokio::task::JoinSet;

fn coordinator(
    store: &Arc<InMemoryRatingStore>,
    broadcaster: &EventBroadcaster,
) -> Arc<SessionCoordinator> {
    let store: Arc<dyn RatingStore> = store.clone();
    Arc::new(SessionCoordinator::new(store, broadcaster.clone()))
}

#[tokio::test]
async fn select_marks_exactly_one_movie_current() {
    let store = Arc::new(InMemoryRatingStore::new());
    let broadcaster = EventBroadcaster::new(16);
    let session = coordinator(&store, &broadcaster);

    let first = store.create_movie("La Strada").await.unwrap();
    let second = store.create_movie("8 1/2").await.unwrap();

    session.select_movie(first.id).await.unwrap();
    session.select_movie(second.id).await.unwrap();

    let current = store.current_movie().await.unwrap().unwrap();
    assert_eq!(current.id, second.id);
    let flagged = store
        .list_movies()
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.is_current)
        .count();
    assert_eq!(flagged, 1);

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.current_movie_id, Some(second.id));
    assert!(!snapshot.rating_open);
}

#[tokio::test]
async fn concurrent_selects_leave_one_current() {
    let store = Arc::new(InMemoryRatingStore::new());
    let broadcaster = EventBroadcaster::new(64);
    let session = coordinator(&store, &broadcaster);

    let mut ids = Vec::new();
    for i in 0..8 {
        ids.push(store.create_movie(&format!("Movie {i}")).await.unwrap().id);
    }

    let mut tasks = JoinSet::new();
    for id in ids {
        let session = session.clone();
        tasks.spawn(async move { session.select_movie(id).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let flagged = store
        .list_movies()
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.is_current)
        .count();
    assert_eq!(flagged, 1);

    // The store flag and the state machine agree on the winner
    let current = store.current_movie().await.unwrap().unwrap();
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.current_movie_id, Some(current.id));
}

#[tokio::test]
async fn start_without_selection_fails() {
    let store = Arc::new(InMemoryRatingStore::new());
    let broadcaster = EventBroadcaster::new(16);
    let session = coordinator(&store, &broadcaster);

    let result = session.start_rating().await;
    assert!(matches!(result, Err(CoreError::InvalidTransition(_))));
    assert_eq!(session.snapshot().await.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn select_unknown_movie_fails() {
    let store = Arc::new(InMemoryRatingStore::new());
    let broadcaster = EventBroadcaster::new(16);
    let session = coordinator(&store, &broadcaster);

    let result = session
        .select_movie(cinerate_core::MovieId::new(42))
        .await;
    assert!(matches!(result, Err(CoreError::MovieNotFound(_))));
    assert!(store.current_movie().await.unwrap().is_none());
}

#[tokio::test]
async fn full_scenario_broadcasts_in_order() {
    let store = Arc::new(InMemoryRatingStore::new());
    let broadcaster = EventBroadcaster::new(16);
    let session = coordinator(&store, &broadcaster);
    let admission =
        AdmissionController::new(store.clone(), session.clone(), broadcaster.clone());

    let movie = store.create_movie("Wings of Desire").await.unwrap();
    assert!(store.insert_code("BBB222").await.unwrap());

    let mut rx = broadcaster.subscribe();

    session.select_movie(movie.id).await.unwrap();
    let started = session.start_rating().await.unwrap();
    assert_eq!(started, movie.id);
    admission
        .submit_rating("BBB222", movie.id, 4.0)
        .await
        .unwrap();
    session.set_idle().await.unwrap();

    let movie_id = movie.id;
    assert_eq!(
        rx.recv().await.unwrap(),
        SessionEvent::MovieSelected { movie_id }
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        SessionEvent::StartRatingSession { movie_id }
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        SessionEvent::RatingUpdate {
            movie_id,
            average: 4.0
        }
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        SessionEvent::RatingCountUpdate {
            movie_id,
            rating_count: 1
        }
    );
    assert_eq!(rx.recv().await.unwrap(), SessionEvent::Idle {});

    assert!(store.current_movie().await.unwrap().is_none());
}

#[tokio::test]
async fn reopen_is_idempotent_and_reemits() {
    let store = Arc::new(InMemoryRatingStore::new());
    let broadcaster = EventBroadcaster::new(16);
    let session = coordinator(&store, &broadcaster);

    let movie = store.create_movie("Stalker").await.unwrap();
    session.select_movie(movie.id).await.unwrap();
    session.start_rating().await.unwrap();

    let mut rx = broadcaster.subscribe();
    let movies_before = store.list_movies().await.unwrap();

    // Re-opening an open window re-emits without touching the store
    session.start_rating().await.unwrap();
    assert_eq!(
        rx.recv().await.unwrap(),
        SessionEvent::StartRatingSession { movie_id: movie.id }
    );
    assert_eq!(store.list_movies().await.unwrap(), movies_before);
    assert!(session.is_rating_open().await);
}

#[tokio::test]
async fn reselect_closes_the_window() {
    let store = Arc::new(InMemoryRatingStore::new());
    let broadcaster = EventBroadcaster::new(16);
    let session = coordinator(&store, &broadcaster);

    let first = store.create_movie("Solaris").await.unwrap();
    let second = store.create_movie("Mirror").await.unwrap();

    session.select_movie(first.id).await.unwrap();
    session.start_rating().await.unwrap();
    assert!(session.is_rating_open_for(first.id).await);

    session.select_movie(second.id).await.unwrap();
    assert!(!session.is_rating_open().await);
    assert!(!session.is_rating_open_for(first.id).await);
    assert_eq!(session.snapshot().await.phase(), SessionPhase::Selected);
}
