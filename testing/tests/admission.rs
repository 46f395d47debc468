//! Integration tests for the admission controller.
//!
//! Exercises the full admission pipeline against [`InMemoryRatingStore`]:
//! code validation, session gating, the one-rating-per-code-per-movie rule
//! under concurrency, and the aggregate broadcasts a successful admission
//! triggers.

#![allow(clippy::unwrap_used)] // Test code can use unwrap

use std::sync::Arc;

use cinerate_core::{
    AdmissionController, CoreError, EventBroadcaster, MovieId, SessionCoordinator, SessionEvent,
};
use cinerate_core::store::RatingStore;
use cinerate_testing::InMemoryRatingStore;
use tokio::task::JoinSet;

struct Harness {
    store: Arc<InMemoryRatingStore>,
    session: Arc<SessionCoordinator>,
    admission: AdmissionController,
    broadcaster: EventBroadcaster,
}

/// Build a controller over a fresh in-memory store with one movie whose
/// rating window is open, and one registered code.
async fn harness() -> (Harness, MovieId) {
    let store = Arc::new(InMemoryRatingStore::new());
    let broadcaster = EventBroadcaster::new(16);
    let session = Arc::new(SessionCoordinator::new(
        store.clone(),
        broadcaster.clone(),
    ));
    let admission = AdmissionController::new(store.clone(), session.clone(), broadcaster.clone());

    let movie = store.create_movie("The Third Man").await.unwrap();
    assert!(store.insert_code("AAA111").await.unwrap());
    session.select_movie(movie.id).await.unwrap();
    session.start_rating().await.unwrap();

    (
        Harness {
            store,
            session,
            admission,
            broadcaster,
        },
        movie.id,
    )
}

#[tokio::test]
async fn admission_persists_and_broadcasts_aggregates() {
    let (h, movie_id) = harness().await;
    let mut rx = h.broadcaster.subscribe();

    let rating = h
        .admission
        .submit_rating("AAA111", movie_id, 4.0)
        .await
        .unwrap();
    assert_eq!(rating.movie_id, movie_id);
    assert_eq!(rating.code, "AAA111");

    // One admission emits exactly ratingUpdate then ratingCountUpdate
    let first = rx.recv().await.unwrap();
    assert_eq!(
        first,
        SessionEvent::RatingUpdate {
            movie_id,
            average: 4.0
        }
    );
    let second = rx.recv().await.unwrap();
    assert_eq!(
        second,
        SessionEvent::RatingCountUpdate {
            movie_id,
            rating_count: 1
        }
    );

    assert!(h.admission.has_rated("AAA111", movie_id).await.unwrap());
    assert_eq!(h.admission.rating_count(movie_id).await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_code_is_rejected() {
    let (h, movie_id) = harness().await;

    let result = h.admission.submit_rating("ZZZ999", movie_id, 3.0).await;
    assert!(matches!(result, Err(CoreError::InvalidCode)));
}

#[tokio::test]
async fn unknown_movie_is_rejected() {
    let (h, _movie_id) = harness().await;

    let missing = MovieId::new(999);
    let result = h.admission.submit_rating("AAA111", missing, 3.0).await;
    assert!(matches!(result, Err(CoreError::MovieNotFound(id)) if id == missing));
}

#[tokio::test]
async fn off_step_value_is_rejected() {
    let (h, movie_id) = harness().await;

    for bad in [0.0, 0.3, 2.75, 5.5, -1.0] {
        let result = h.admission.submit_rating("AAA111", movie_id, bad).await;
        assert!(
            matches!(result, Err(CoreError::InvalidRatingValue(v)) if v == bad),
            "value {bad} should be rejected"
        );
    }
}

#[tokio::test]
async fn second_submission_is_rejected() {
    let (h, movie_id) = harness().await;

    h.admission
        .submit_rating("AAA111", movie_id, 4.5)
        .await
        .unwrap();
    let result = h.admission.submit_rating("AAA111", movie_id, 2.0).await;
    assert!(matches!(result, Err(CoreError::AlreadyRated { movie_id: id }) if id == movie_id));

    // The first value stands
    assert_eq!(h.store.movie_average(movie_id).await.unwrap(), 4.5);
}

#[tokio::test]
async fn closed_window_rejects_submissions() {
    let (h, movie_id) = harness().await;

    h.session.set_idle().await.unwrap();
    let result = h.admission.submit_rating("AAA111", movie_id, 3.0).await;
    assert!(matches!(result, Err(CoreError::RatingClosed(id)) if id == movie_id));
}

#[tokio::test]
async fn selecting_without_starting_keeps_window_closed() {
    let store = Arc::new(InMemoryRatingStore::new());
    let broadcaster = EventBroadcaster::new(16);
    let session = Arc::new(SessionCoordinator::new(
        store.clone(),
        broadcaster.clone(),
    ));
    let admission = AdmissionController::new(store.clone(), session.clone(), broadcaster);

    let movie = store.create_movie("Rear Window").await.unwrap();
    assert!(store.insert_code("AAA111").await.unwrap());
    session.select_movie(movie.id).await.unwrap();

    let result = admission.submit_rating("AAA111", movie.id, 3.0).await;
    assert!(matches!(result, Err(CoreError::RatingClosed(_))));
}

#[tokio::test]
async fn concurrent_duplicates_admit_exactly_one() {
    let (h, movie_id) = harness().await;

    let mut tasks = JoinSet::new();
    for i in 0..16 {
        let admission = h.admission.clone();
        #[allow(clippy::cast_precision_loss)]
        let value = 0.5 + f64::from(i % 10) * 0.5;
        tasks.spawn(async move { admission.submit_rating("AAA111", movie_id, value).await });
    }

    let mut successes = 0;
    let mut duplicates = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => successes += 1,
            Err(CoreError::AlreadyRated { .. }) => duplicates += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(duplicates, 15);
    assert_eq!(h.store.movie_rating_count(movie_id).await.unwrap(), 1);
}

#[tokio::test]
async fn clear_ratings_broadcasts_and_leaves_session_open() {
    let (h, movie_id) = harness().await;

    h.admission
        .submit_rating("AAA111", movie_id, 5.0)
        .await
        .unwrap();

    let mut rx = h.broadcaster.subscribe();
    h.admission.clear_ratings().await.unwrap();

    assert_eq!(rx.recv().await.unwrap(), SessionEvent::RatingClear {});
    assert_eq!(h.store.movie_rating_count(movie_id).await.unwrap(), 0);

    // The session is untouched: the same code can rate again immediately
    assert!(h.session.is_rating_open_for(movie_id).await);
    h.admission
        .submit_rating("AAA111", movie_id, 1.5)
        .await
        .unwrap();
}
