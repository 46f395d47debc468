//! Access code allocation.
//!
//! Codes are short random strings over an uppercase alphanumeric alphabet.
//! Uniqueness is enforced by the store on insert ([`RatingStore::insert_code`]
//! returns `false` on collision), so allocation is race-safe without a
//! separate existence check: draw, try to insert, retry on collision.
//!
//! The domain places no bound on retries, but the allocator must not assume
//! termination: each code gets a configurable attempt cap, and exceeding it
//! fails the whole batch with [`CoreError::CodeSpaceExhausted`].

use crate::error::CoreError;
use crate::store::RatingStore;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

/// The code alphabet: uppercase letters and digits, 36 symbols.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Allocation parameters.
///
/// The source history carried two incompatible code lengths (3 and 6), so
/// the length is configuration rather than a constant.
#[derive(Clone, Copy, Debug)]
pub struct CodeConfig {
    /// Number of characters per code
    pub length: usize,
    /// Maximum random draws per code before the batch fails
    pub max_attempts: u32,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            length: 6,
            max_attempts: 64,
        }
    }
}

/// Generates unique access codes backed by the store.
pub struct CodeAllocator {
    store: Arc<dyn RatingStore>,
    config: CodeConfig,
}

impl CodeAllocator {
    /// Create an allocator with the given parameters.
    #[must_use]
    pub const fn new(store: Arc<dyn RatingStore>, config: CodeConfig) -> Self {
        Self { store, config }
    }

    /// Generate `count` distinct new codes.
    ///
    /// Each generated code starts with an empty rated-movie set and no admin
    /// rights. Codes inserted before the failure point are kept; operators
    /// can retry for the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CodeSpaceExhausted`] when a single code exceeds
    /// the attempt cap, [`CoreError::Store`] on storage failure.
    pub async fn generate(&self, count: usize) -> Result<Vec<String>, CoreError> {
        let mut codes = Vec::with_capacity(count);
        for _ in 0..count {
            codes.push(self.generate_one().await?);
        }
        info!(count = codes.len(), length = self.config.length, "access codes generated");
        Ok(codes)
    }

    async fn generate_one(&self) -> Result<String, CoreError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            if attempts > self.config.max_attempts {
                return Err(CoreError::CodeSpaceExhausted {
                    attempts: self.config.max_attempts,
                });
            }

            let code = random_code(self.config.length);
            if self.store.insert_code(&code).await? {
                return Ok(code);
            }
            debug!(%code, attempts, "code collision, redrawing");
        }
    }
}

/// Draw one random code of the given length from [`CODE_ALPHABET`].
fn random_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
        .collect()
}
