//! Long URL validation and normalization.
//!
//! Input must parse as an absolute URL. Anything that is not http or https is
//! rewritten to https, the host must be present, and the normalized form has
//! to look like `scheme://host.tld/optional-path`.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use url::{Position, Url};

static WEB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(/.*)?$").expect("static regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed url: {0}")]
    MalformedUri(String),
    #[error("url has no host")]
    MissingHost,
    #[error("url is not a web address: {0}")]
    PatternMismatch(String),
}

impl ValidationError {
    /// Short machine-readable reason for logs
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MalformedUri(_) => "malformed_uri",
            ValidationError::MissingHost => "missing_host",
            ValidationError::PatternMismatch(_) => "pattern_mismatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl {
    /// Canonical serialization; the dedup key
    pub url: String,
    /// Lower-cased host
    pub host: String,
}

fn has_host(url: &Url) -> bool {
    url.host_str().is_some_and(|host| !host.is_empty())
}

pub fn normalize_long_url(input: &str) -> Result<ValidatedUrl, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::MalformedUri("empty url".to_string()));
    }

    let mut url = Url::parse(input).map_err(|err| match err {
        url::ParseError::EmptyHost => ValidationError::MissingHost,
        other => ValidationError::MalformedUri(other.to_string()),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        if !has_host(&url) {
            return Err(ValidationError::MissingHost);
        }
        // Switching between special and non-special schemes is not allowed
        // in place, so re-parse the remainder under https.
        if url.set_scheme("https").is_err() {
            let rewritten = format!("https{}", &url[Position::AfterScheme..]);
            url = Url::parse(&rewritten)
                .map_err(|err| ValidationError::MalformedUri(err.to_string()))?;
        }
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Err(ValidationError::MissingHost),
    };

    let normalized = String::from(url);
    if !WEB_URL.is_match(&normalized) {
        return Err(ValidationError::PatternMismatch(normalized));
    }

    Ok(ValidatedUrl {
        url: normalized,
        host,
    })
}
