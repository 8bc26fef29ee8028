use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub links: LinkConfig,
    pub codes: CodeConfig,
    pub top_domains: TopDomainsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Base used to build short URLs when the caller does not supply a domain
    pub default_domain: String,
    pub ttl_days: i64,
}

/// Tuning for the short code generator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeConfig {
    pub length: usize,
    pub max_length: usize,
    pub hash_bytes: usize,
    pub max_hash_bytes: usize,
    /// Consecutive collisions tolerated before codes grow by one character
    pub growth_threshold: usize,
    pub max_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopDomainsConfig {
    pub limit: usize,
    pub interval_ms: u64,
}

impl LinkConfig {
    pub const DEFAULT_DOMAIN: &'static str = "http://localhost:8080";
    /// Upper bound on `LINK_TTL_DAYS`, roughly a century
    pub const MAX_TTL_DAYS: i64 = 36_500;

    /// Record lifetime, or `None` when `ttl_days` does not fit a `TimeDelta`
    pub fn ttl(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_days(self.ttl_days)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=Self::MAX_TTL_DAYS).contains(&self.ttl_days) {
            bail!(
                "LINK_TTL_DAYS must be between 1 and {}, got {}",
                Self::MAX_TTL_DAYS,
                self.ttl_days
            );
        }
        Ok(())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            default_domain: Self::DEFAULT_DOMAIN.to_string(),
            ttl_days: 7,
        }
    }
}

impl CodeConfig {
    /// SHA-256 digest size; the prefix can never be longer than this
    pub const DIGEST_BYTES: usize = 32;

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.length == 0 || self.hash_bytes == 0 {
            bail!("CODE_LENGTH and CODE_HASH_BYTES must be positive");
        }
        if self.length > self.max_length {
            bail!(
                "CODE_LENGTH ({}) exceeds CODE_MAX_LENGTH ({})",
                self.length,
                self.max_length
            );
        }
        if self.hash_bytes > self.max_hash_bytes {
            bail!(
                "CODE_HASH_BYTES ({}) exceeds CODE_MAX_HASH_BYTES ({})",
                self.hash_bytes,
                self.max_hash_bytes
            );
        }
        if self.max_hash_bytes > Self::DIGEST_BYTES {
            bail!(
                "CODE_MAX_HASH_BYTES ({}) exceeds the {} byte digest",
                self.max_hash_bytes,
                Self::DIGEST_BYTES
            );
        }
        // A base62 character carries just under 6 bits
        if self.max_length * 6 > self.hash_bytes * 8 {
            bail!(
                "CODE_HASH_BYTES ({}) is too short for {} character codes",
                self.hash_bytes,
                self.max_length
            );
        }
        if self.growth_threshold == 0 || self.max_attempts == 0 {
            bail!("CODE_GROWTH_THRESHOLD and CODE_MAX_ATTEMPTS must be positive");
        }
        Ok(())
    }
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            length: 6,
            max_length: 10,
            hash_bytes: 16,
            max_hash_bytes: 32,
            growth_threshold: 3,
            max_attempts: 64,
        }
    }
}

impl TopDomainsConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.limit == 0 {
            bail!("TOP_DOMAINS_LIMIT must be positive");
        }
        if self.interval_ms == 0 {
            bail!("TOP_DOMAINS_INTERVAL_MS must be positive");
        }
        Ok(())
    }
}

impl Default for TopDomainsConfig {
    fn default() -> Self {
        Self {
            limit: 3,
            interval_ms: 2000,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_or("PORT", 8080u16)?;

        let default_domain = std::env::var("DEFAULT_DOMAIN")
            .ok()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| LinkConfig::DEFAULT_DOMAIN.to_string());
        let links = LinkConfig {
            default_domain,
            ttl_days: env_or("LINK_TTL_DAYS", 7i64)?,
        };
        links.validate()?;

        let defaults = CodeConfig::default();
        let codes = CodeConfig {
            length: env_or("CODE_LENGTH", defaults.length)?,
            max_length: env_or("CODE_MAX_LENGTH", defaults.max_length)?,
            hash_bytes: env_or("CODE_HASH_BYTES", defaults.hash_bytes)?,
            max_hash_bytes: env_or("CODE_MAX_HASH_BYTES", defaults.max_hash_bytes)?,
            growth_threshold: env_or("CODE_GROWTH_THRESHOLD", defaults.growth_threshold)?,
            max_attempts: env_or("CODE_MAX_ATTEMPTS", defaults.max_attempts)?,
        };
        codes.validate()?;

        let top_domains = TopDomainsConfig {
            limit: env_or("TOP_DOMAINS_LIMIT", 3usize)?,
            interval_ms: env_or("TOP_DOMAINS_INTERVAL_MS", 2000u64)?,
        };
        top_domains.validate()?;

        Ok(Config {
            server: ServerConfig { host, port },
            links,
            codes,
            top_domains,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_code_config_is_valid() {
        assert!(CodeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_code_config_rejects_inverted_bounds() {
        let config = CodeConfig {
            length: 12,
            ..CodeConfig::default()
        };
        assert!(config.validate().is_err());

        let config = CodeConfig {
            max_hash_bytes: 40,
            ..CodeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_code_config_rejects_zero_attempts() {
        let config = CodeConfig {
            max_attempts: 0,
            ..CodeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_link_ttl_in_days() {
        let links = LinkConfig::default();
        assert_eq!(links.ttl(), Some(chrono::Duration::days(7)));
        assert!(links.validate().is_ok());
    }

    #[test]
    fn test_link_ttl_bounds() {
        for ttl_days in [0, -1, LinkConfig::MAX_TTL_DAYS + 1, 200_000_000, i64::MAX] {
            let links = LinkConfig {
                ttl_days,
                ..LinkConfig::default()
            };
            assert!(links.validate().is_err(), "{ttl_days} days should be rejected");
        }

        let links = LinkConfig {
            ttl_days: LinkConfig::MAX_TTL_DAYS,
            ..LinkConfig::default()
        };
        assert!(links.validate().is_ok());
        assert!(links.ttl().is_some());

        let links = LinkConfig {
            ttl_days: i64::MAX,
            ..LinkConfig::default()
        };
        assert_eq!(links.ttl(), None);
    }

    #[test]
    fn test_top_domains_rejects_zero_limit() {
        assert!(TopDomainsConfig::default().validate().is_ok());

        let config = TopDomainsConfig {
            limit: 0,
            ..TopDomainsConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TopDomainsConfig {
            interval_ms: 0,
            ..TopDomainsConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
