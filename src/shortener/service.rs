use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analytics::DomainCount;
use crate::config::{CodeConfig, Config, LinkConfig};
use crate::models::{RedirectTarget, ShortRecord, ShortenRequest, ShortenResponse};
use crate::shortener::generator::{CodeGenerator, GenerateError};
use crate::shortener::validation::{normalize_long_url, ValidationError};
use crate::storage::{Storage, StorageError, StorageStats};

/// Insert races tolerated per request before giving up
const MAX_INSERT_RACES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortenError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("could not allocate a short code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },
    #[error("link expiry is out of the representable time range")]
    ExpiryOutOfRange,
}

impl From<GenerateError> for ShortenError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Exhausted { attempts } => ShortenError::CodeSpaceExhausted { attempts },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("malformed short code")]
    MalformedCode,
    #[error("short code not found")]
    NotFound,
    #[error("short link has expired")]
    Expired,
}

/// Entry point for adapters: shorten, resolve and leaderboard reads
pub struct ShorteningService {
    storage: Arc<dyn Storage>,
    generator: CodeGenerator,
    default_domain: String,
    ttl: Option<chrono::Duration>,
}

impl ShorteningService {
    pub fn new(storage: Arc<dyn Storage>, links: &LinkConfig, codes: CodeConfig) -> Self {
        Self {
            storage,
            generator: CodeGenerator::new(codes),
            default_domain: links.default_domain.clone(),
            ttl: links.ttl(),
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self::new(storage, &config.links, config.codes)
    }

    pub fn default_domain(&self) -> &str {
        &self.default_domain
    }

    pub fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    pub async fn shorten(&self, request: ShortenRequest) -> Result<ShortenResponse, ShortenError> {
        self.shorten_at(request, Utc::now()).await
    }

    /// Shorten with an explicit creation time
    pub async fn shorten_at(
        &self,
        request: ShortenRequest,
        now: DateTime<Utc>,
    ) -> Result<ShortenResponse, ShortenError> {
        let validated = normalize_long_url(&request.long_url).inspect_err(|err| {
            debug!(reason = err.reason(), error = %err, "Rejected long url");
        })?;

        if let Some(existing) = self.find_by_long_url(&validated.url).await {
            debug!(code = %existing.code, "Long url already shortened");
            return Ok(ShortenResponse::from(&existing));
        }

        let expiry_at = self
            .ttl
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(ShortenError::ExpiryOutOfRange)?;

        let display_domain = request
            .domain
            .map(|domain| domain.trim().to_string())
            .filter(|domain| !domain.is_empty())
            .unwrap_or_else(|| self.default_domain.clone());

        for _ in 0..MAX_INSERT_RACES {
            let code = self
                .generator
                .generate(self.storage.as_ref(), &validated.url)
                .await?;

            let record = ShortRecord {
                code: code.clone(),
                long_url: validated.url.clone(),
                domain: validated.host.clone(),
                display_domain: display_domain.clone(),
                created_at: now,
                expiry_at,
            };
            let response = ShortenResponse::from(&record);

            match self.storage.insert_if_absent(&code, record).await {
                Ok(()) => {
                    debug!(code = %code, domain = %validated.host, "Created short link");
                    return Ok(response);
                }
                Err(StorageError::DuplicateLongUrl { code: winner }) => {
                    if let Some(existing) = self.storage.get_by_code(&winner).await {
                        debug!(code = %winner, "Lost insert race for long url");
                        return Ok(ShortenResponse::from(&existing));
                    }
                }
                Err(StorageError::Conflict) => {
                    if let Some(existing) = self.find_by_long_url(&validated.url).await {
                        return Ok(ShortenResponse::from(&existing));
                    }
                    warn!(code = %code, "Short code taken concurrently, regenerating");
                }
            }
        }

        Err(ShortenError::CodeSpaceExhausted {
            attempts: MAX_INSERT_RACES,
        })
    }

    async fn find_by_long_url(&self, long_url: &str) -> Option<ShortRecord> {
        let code = self.storage.get_by_long_url(long_url).await?;
        self.storage.get_by_code(&code).await
    }

    /// Resolve a code to its target, or nothing if it is unknown or expired
    pub async fn redirect(&self, code: &str) -> Option<RedirectTarget> {
        self.resolve(code).await.ok()
    }

    pub async fn resolve(&self, code: &str) -> Result<RedirectTarget, ResolveError> {
        self.resolve_at(code, Utc::now()).await
    }

    /// Resolve against an explicit clock
    pub async fn resolve_at(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<RedirectTarget, ResolveError> {
        if !self.generator.is_valid_code(code) {
            return Err(ResolveError::MalformedCode);
        }

        let record = self
            .storage
            .get_by_code(code)
            .await
            .ok_or(ResolveError::NotFound)?;

        if record.is_expired_at(now) {
            return Err(ResolveError::Expired);
        }

        Ok(RedirectTarget {
            long_url: record.long_url,
            domain: record.display_domain,
        })
    }

    pub async fn top_domains(&self) -> Vec<DomainCount> {
        self.storage.read_top_domains().await
    }

    pub async fn stats(&self) -> StorageStats {
        self.storage.stats().await
    }
}
