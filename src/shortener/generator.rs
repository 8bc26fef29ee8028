//! Short code generation
//!
//! A candidate code is the base62 rendering of a SHA-256 prefix of
//! `long_url ++ seed`, cut to the current code length and upper-cased. The
//! first candidate for a URL uses an empty seed, so it is deterministic. Each
//! collision reseeds from the clock plus a random token; every
//! `growth_threshold` consecutive collisions raise the digest prefix and the
//! code length by one, up to the configured maxima.
//!
//! The growth level is shared by every caller and never goes back down: once
//! the namespace has forced longer codes, later codes start long.

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CodeConfig;
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("no free short code after {attempts} attempts")]
    Exhausted { attempts: usize },
}

#[derive(Debug)]
pub struct CodeGenerator {
    config: CodeConfig,
    growth: AtomicUsize,
}

impl CodeGenerator {
    pub fn new(config: CodeConfig) -> Self {
        Self {
            config,
            growth: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &CodeConfig {
        &self.config
    }

    /// Growth stops once codes reach `max_length`; a longer digest prefix
    /// alone never changes the leading characters of a code.
    fn max_growth(&self) -> usize {
        self.config.max_length.saturating_sub(self.config.length)
    }

    /// `(hash_bytes, code_length)` at a growth level, each clamped to its bound
    fn lengths_at(&self, level: usize) -> (usize, usize) {
        (
            (self.config.hash_bytes + level).min(self.config.max_hash_bytes),
            (self.config.length + level).min(self.config.max_length),
        )
    }

    /// Current `(hash_bytes, code_length)`
    pub fn current_lengths(&self) -> (usize, usize) {
        self.lengths_at(self.growth.load(Ordering::Acquire))
    }

    /// Whether `code` could have been produced by this generator
    pub fn is_valid_code(&self, code: &str) -> bool {
        (self.config.length..=self.config.max_length).contains(&code.len())
            && code
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
    }

    /// Derive a candidate code. Pure: the same inputs give the same code.
    pub fn candidate(long_url: &str, seed: &str, hash_bytes: usize, length: usize) -> String {
        let digest = Sha256::new()
            .chain_update(long_url.as_bytes())
            .chain_update(seed.as_bytes())
            .finalize();
        let prefix = &digest[..hash_bytes.min(digest.len())];

        // base62 works on u128, so longer prefixes are rendered per 16 bytes
        let mut encoded = String::with_capacity(length + 22);
        for chunk in prefix.chunks(16) {
            let value = chunk
                .iter()
                .fold(0u128, |acc, byte| (acc << 8) | u128::from(*byte));
            encoded.push_str(&base62::encode(value));
            if encoded.len() >= length {
                break;
            }
        }

        let mut code: String = encoded.chars().take(length).collect();
        code.make_ascii_uppercase();
        if code.len() < length {
            code = format!("{code:0>length$}");
        }
        code
    }

    /// Produce a code that is not in `storage` at the time of the check.
    ///
    /// The check is advisory: the caller still has to win
    /// [`Storage::insert_if_absent`].
    pub async fn generate(
        &self,
        storage: &dyn Storage,
        long_url: &str,
    ) -> Result<String, GenerateError> {
        let mut seed = String::new();
        let mut consecutive = 0;

        for attempt in 1..=self.config.max_attempts {
            let level = self.growth.load(Ordering::Acquire);
            let (hash_bytes, length) = self.lengths_at(level);
            let code = Self::candidate(long_url, &seed, hash_bytes, length);

            if !storage.code_exists(&code).await {
                return Ok(code);
            }

            debug!(attempt, code = %code, "Short code collision, reseeding");
            seed = fresh_seed();
            consecutive += 1;
            if consecutive >= self.config.growth_threshold {
                consecutive = 0;
                self.grow(level);
            }
        }

        warn!(
            attempts = self.config.max_attempts,
            "Gave up generating a short code"
        );
        Err(GenerateError::Exhausted {
            attempts: self.config.max_attempts,
        })
    }

    /// Move from `observed` to the next growth level. Concurrent callers that
    /// observed the same level grow it once between them.
    fn grow(&self, observed: usize) {
        if observed >= self.max_growth() {
            return;
        }
        if self
            .growth
            .compare_exchange(observed, observed + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let (hash_bytes, length) = self.lengths_at(observed + 1);
            warn!(hash_bytes, length, "Repeated collisions, growing short codes");
        }
    }
}

fn fresh_seed() -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    format!("{nanos}{}", rand::random::<u64>())
}
