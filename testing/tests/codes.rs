//! Integration tests for the access code allocator.

#![allow(clippy::unwrap_used)] // Test code can use unwrap

use std::collections::BTreeSet;
use std::sync::Arc;

use cinerate_core::codes::CODE_ALPHABET;
use cinerate_core::store::RatingStore;
use cinerate_core::{CodeAllocator, CodeConfig, CoreError};
use cinerate_testing::InMemoryRatingStore;

#[tokio::test]
async fn generates_distinct_codes_of_configured_length() {
    let store = Arc::new(InMemoryRatingStore::new());
    let allocator = CodeAllocator::new(store.clone(), CodeConfig::default());

    let codes = allocator.generate(5).await.unwrap();
    assert_eq!(codes.len(), 5);

    let distinct: BTreeSet<&String> = codes.iter().collect();
    assert_eq!(distinct.len(), 5);

    for code in &codes {
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    // Every code is registered in the store with an empty rated set
    for code in &codes {
        let stored = store.find_access_code(code).await.unwrap().unwrap();
        assert!(stored.rated_movies.is_empty());
        assert!(!stored.is_admin);
    }
}

#[tokio::test]
async fn collisions_are_retried() {
    let store = Arc::new(InMemoryRatingStore::new());

    // Length 1 over a 36-symbol alphabet with most symbols taken: every draw
    // is likely to collide at least once, and retries must still converge.
    for b in CODE_ALPHABET.iter().take(30) {
        assert!(store.insert_code(&(*b as char).to_string()).await.unwrap());
    }

    let config = CodeConfig {
        length: 1,
        max_attempts: 10_000,
    };
    let allocator = CodeAllocator::new(store.clone(), config);

    let codes = allocator.generate(6).await.unwrap();
    assert_eq!(codes.len(), 6);
    assert_eq!(store.list_codes().await.unwrap().len(), 36);
}

#[tokio::test]
async fn exhausted_code_space_fails_the_batch() {
    let store = Arc::new(InMemoryRatingStore::new());

    // Fill the entire length-1 code space
    for b in CODE_ALPHABET.iter() {
        assert!(store.insert_code(&(*b as char).to_string()).await.unwrap());
    }

    let config = CodeConfig {
        length: 1,
        max_attempts: 50,
    };
    let allocator = CodeAllocator::new(store.clone(), config);

    let result = allocator.generate(1).await;
    assert!(matches!(
        result,
        Err(CoreError::CodeSpaceExhausted { attempts: 50 })
    ));
}

#[tokio::test]
async fn partial_batches_keep_inserted_codes() {
    let store = Arc::new(InMemoryRatingStore::new());

    // 35 of 36 length-1 codes taken: the first draw can succeed, but a
    // second distinct code cannot exist once the space is full.
    for b in CODE_ALPHABET.iter().take(35) {
        assert!(store.insert_code(&(*b as char).to_string()).await.unwrap());
    }

    let config = CodeConfig {
        length: 1,
        max_attempts: 10_000,
    };
    let allocator = CodeAllocator::new(store.clone(), config);

    let result = allocator.generate(2).await;
    assert!(matches!(result, Err(CoreError::CodeSpaceExhausted { .. })));

    // The code that made it in before the failure is kept
    assert_eq!(store.list_codes().await.unwrap().len(), 36);
}
