//! Verification settings.
//!
//! Built once at startup (usually from the environment) and handed to the
//! verifier; nothing reads configuration from globals afterwards.

use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::key_cache::{DEFAULT_FETCH_TIMEOUT, DEFAULT_MIN_REFRESH_INTERVAL};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Expected token properties plus key-set fetch settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Expected `aud` claim.
    pub audience: String,
    /// Expected `iss` claim.
    pub issuer: String,
    /// Accepted signing algorithms; asymmetric only.
    pub algorithms: Vec<Algorithm>,
    /// Where the issuer publishes its JWKS document.
    pub jwks_url: String,
    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,
    pub jwks_timeout: Duration,
    pub min_refresh_interval: Duration,
}

impl AuthConfig {
    /// Settings for an Auth0-style tenant: issuer `https://{domain}/` and keys
    /// at `https://{domain}/.well-known/jwks.json`, RS256 only.
    pub fn for_domain(domain: &str, audience: impl Into<String>) -> Self {
        let domain = domain.trim_end_matches('/');
        Self {
            audience: audience.into(),
            issuer: format!("https://{domain}/"),
            algorithms: vec![Algorithm::RS256],
            jwks_url: format!("https://{domain}/.well-known/jwks.json"),
            leeway_secs: 0,
            jwks_timeout: DEFAULT_FETCH_TIMEOUT,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_secs = seconds;
        self
    }

    /// Read settings from process environment variables.
    ///
    /// `AUTH0_DOMAIN` and `API_AUDIENCE` are required; `ALGORITHMS`,
    /// `AUTH_ISSUER`, `JWKS_URL`, `JWT_LEEWAY_SECS` and `JWKS_TIMEOUT_MS`
    /// override the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());

        let domain = get("AUTH0_DOMAIN").ok_or(ConfigError::Missing("AUTH0_DOMAIN"))?;
        let audience = get("API_AUDIENCE").ok_or(ConfigError::Missing("API_AUDIENCE"))?;
        let mut config = Self::for_domain(domain.trim(), audience.trim());

        if let Some(raw) = get("ALGORITHMS") {
            config.algorithms = parse_algorithms(&raw)?;
        }
        if let Some(issuer) = get("AUTH_ISSUER") {
            config = config.with_issuer(issuer.trim());
        }
        if let Some(url) = get("JWKS_URL") {
            config = config.with_jwks_url(url.trim());
        }
        if let Some(raw) = get("JWT_LEEWAY_SECS") {
            config = config.with_leeway(parse_number("JWT_LEEWAY_SECS", &raw)?);
        }
        if let Some(raw) = get("JWKS_TIMEOUT_MS") {
            config.jwks_timeout = Duration::from_millis(parse_number("JWKS_TIMEOUT_MS", &raw)?);
        }

        Ok(config)
    }
}

/// Parse a comma-separated algorithm list, rejecting shared-secret (HS*)
/// algorithms.
pub fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let algorithm = Algorithm::from_str(name).map_err(|_| ConfigError::Invalid {
            var: "ALGORITHMS",
            reason: format!("unknown algorithm '{name}'"),
        })?;
        if matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(ConfigError::Invalid {
                var: "ALGORITHMS",
                reason: format!("symmetric algorithm '{name}' is not accepted"),
            });
        }
        if !algorithms.contains(&algorithm) {
            algorithms.push(algorithm);
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::Invalid {
            var: "ALGORITHMS",
            reason: "no algorithms listed".to_string(),
        });
    }
    Ok(algorithms)
}

fn parse_number(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("{e}"),
    })
}
