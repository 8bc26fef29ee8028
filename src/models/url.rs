use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened link. Never mutated once it is in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortRecord {
    pub code: String,
    /// Normalized long URL, also the key of the dedup index
    pub long_url: String,
    /// Host of the long URL; the unit the leaderboard counts
    pub domain: String,
    /// Domain the short URL is served under
    pub display_domain: String,
    pub created_at: DateTime<Utc>,
    pub expiry_at: DateTime<Utc>,
}

impl ShortRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_at
    }

    pub fn short_url(&self) -> String {
        short_url(&self.display_domain, &self.code)
    }
}

/// Join a display domain and a code; bare hosts are served over https.
pub fn short_url(display_domain: &str, code: &str) -> String {
    let base = display_domain.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{base}/{code}")
    } else {
        format!("https://{base}/{code}")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShortenRequest {
    #[serde(rename = "longURL")]
    pub long_url: String,
    #[serde(default)]
    pub domain: Option<String>,
}

impl ShortenRequest {
    pub fn new(long_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
            domain: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortenResponse {
    pub code: String,
    #[serde(rename = "shortURL")]
    pub short_url: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiryDate")]
    pub expiry_at: DateTime<Utc>,
}

impl From<&ShortRecord> for ShortenResponse {
    fn from(record: &ShortRecord) -> Self {
        Self {
            code: record.code.clone(),
            short_url: record.short_url(),
            created_at: record.created_at,
            expiry_at: record.expiry_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectTarget {
    pub long_url: String,
    pub domain: String,
}
