//! Signing key sets and where they come from.
//!
//! A [`SigningKeySet`] is built from a JWKS document published by the token
//! issuer. Only asymmetric keys carrying a `kid` are kept; shared-secret
//! (`oct`) keys and encryption keys are dropped on load.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("key set request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("key set fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("key set unavailable, last fetch failed: {0}")]
    Unavailable(String),

    #[error("no signing key with id '{kid}'")]
    UnknownKey { kid: String },
}

/// Asymmetric algorithm family a key can verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Rsa,
    Ec,
    Ed,
}

impl KeyFamily {
    pub fn supports(self, algorithm: Algorithm) -> bool {
        matches!(
            (self, algorithm),
            (
                KeyFamily::Rsa,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ) | (KeyFamily::Ec, Algorithm::ES256 | Algorithm::ES384)
                | (KeyFamily::Ed, Algorithm::EdDSA)
        )
    }

    fn of(params: &AlgorithmParameters) -> Option<Self> {
        match params {
            AlgorithmParameters::RSA(_) => Some(KeyFamily::Rsa),
            AlgorithmParameters::EllipticCurve(_) => Some(KeyFamily::Ec),
            AlgorithmParameters::OctetKeyPair(_) => Some(KeyFamily::Ed),
            _ => None,
        }
    }
}

/// A public key able to verify token signatures.
pub struct SigningKey {
    kid: String,
    family: KeyFamily,
    key: DecodingKey,
}

impl SigningKey {
    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn family(&self) -> KeyFamily {
        self.family
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }

    fn from_jwk(jwk: &Jwk) -> Option<Self> {
        let kid = jwk.common.key_id.clone()?;
        if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
            return None;
        }
        let family = KeyFamily::of(&jwk.algorithm)?;

        match DecodingKey::from_jwk(jwk) {
            Ok(key) => Some(Self { kid, family, key }),
            Err(e) => {
                tracing::warn!(kid = %kid, error = %e, "skipping unusable signing key");
                None
            }
        }
    }
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

/// Immutable mapping from key id to signing key.
#[derive(Debug, Default)]
pub struct SigningKeySet {
    keys: HashMap<String, Arc<SigningKey>>,
}

impl SigningKeySet {
    pub fn from_jwks(jwks: &JwkSet) -> Self {
        let keys = jwks
            .keys
            .iter()
            .filter_map(SigningKey::from_jwk)
            .map(|key| (key.kid.clone(), Arc::new(key)))
            .collect();
        Self { keys }
    }

    pub fn get(&self, kid: &str) -> Option<Arc<SigningKey>> {
        self.keys.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Trusted origin of the signing key set.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeySetError>;
}

/// Fetches the JWKS document over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
    url: String,
    client: reqwest::Client,
}

impl HttpKeySetSource {
    /// Build a source whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        let jwks = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        tracing::debug!(keys = jwks.keys.len(), "fetched signing key set");
        Ok(jwks)
    }
}

/// Serves a fixed key set (local development, tests).
#[derive(Debug, Clone)]
pub struct StaticKeySetSource {
    jwks: JwkSet,
}

impl StaticKeySetSource {
    pub fn new(jwks: JwkSet) -> Self {
        Self { jwks }
    }
}

#[async_trait]
impl KeySetSource for StaticKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        Ok(self.jwks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const N: &str = "wTHXce79BpavPo9Jen6WEgv2bb6bLSdQ9AQ01iIyIVVXep7RCj5LaB9SkeOLqMHjH3o3x7xNbZ3jmhUF-uYciOo6lzj_kBX-xRBT5YIG8DYQc5ij1wuxoRp-7qps_IC_9MYvc8HTlz9hb5m8KuV98JS4ci13b7dhzO4f-ezP5EH5Vu4sg6QSe1VmTOFsLI0erObMPMlVUZ4eMVFKiI0BI8TtS3WU4jzWtiOM-j49YbVn3APkOxlcXwpIVGi_9_0uJ7At1d1D-Nxso9q-wTEEVFN-10M57xAJrAoSzFL9Ti1vunftn79X3cWpzRd93zgxmrgzY1YazNvjxVeKFhNSVQ";

    fn jwks(keys: serde_json::Value) -> JwkSet {
        serde_json::from_value(json!({ "keys": keys })).unwrap()
    }

    #[test]
    fn keeps_rsa_signing_keys_by_kid() {
        let set = SigningKeySet::from_jwks(&jwks(json!([
            {"kty": "RSA", "kid": "k1", "use": "sig", "alg": "RS256", "n": N, "e": "AQAB"}
        ])));

        assert_eq!(set.len(), 1);
        let key = set.get("k1").unwrap();
        assert_eq!(key.family(), KeyFamily::Rsa);
        assert!(set.get("k2").is_none());
    }

    #[test]
    fn drops_keys_without_kid() {
        let set = SigningKeySet::from_jwks(&jwks(json!([
            {"kty": "RSA", "n": N, "e": "AQAB"}
        ])));
        assert!(set.is_empty());
    }

    #[test]
    fn drops_symmetric_keys() {
        let set = SigningKeySet::from_jwks(&jwks(json!([
            {"kty": "oct", "kid": "shared", "k": "c2VjcmV0"}
        ])));
        assert!(!set.contains("shared"));
    }

    #[test]
    fn drops_encryption_keys() {
        let set = SigningKeySet::from_jwks(&jwks(json!([
            {"kty": "RSA", "kid": "enc", "use": "enc", "n": N, "e": "AQAB"}
        ])));
        assert!(set.is_empty());
    }

    #[test]
    fn family_support_matrix() {
        assert!(KeyFamily::Rsa.supports(Algorithm::RS256));
        assert!(KeyFamily::Rsa.supports(Algorithm::PS512));
        assert!(!KeyFamily::Rsa.supports(Algorithm::ES256));
        assert!(!KeyFamily::Rsa.supports(Algorithm::HS256));
        assert!(KeyFamily::Ec.supports(Algorithm::ES384));
        assert!(KeyFamily::Ed.supports(Algorithm::EdDSA));
    }

    #[tokio::test]
    async fn static_source_serves_its_document() {
        let source = StaticKeySetSource::new(jwks(json!([
            {"kty": "RSA", "kid": "k1", "n": N, "e": "AQAB"}
        ])));
        let fetched = source.fetch().await.unwrap();
        assert_eq!(fetched.keys.len(), 1);
    }

    /// Answer every request on an ephemeral port with `status` and `body`.
    async fn spawn_issuer(status: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        format!("http://{addr}/.well-known/jwks.json")
    }

    #[tokio::test]
    async fn http_source_fetches_published_document() {
        let body = json!({"keys": [{"kty": "RSA", "kid": "k1", "use": "sig", "n": N, "e": "AQAB"}]});
        let url = spawn_issuer("200 OK", body.to_string()).await;
        let source = HttpKeySetSource::new(url, Duration::from_secs(2)).unwrap();

        let fetched = source.fetch().await.unwrap();
        let set = SigningKeySet::from_jwks(&fetched);
        assert!(set.contains("k1"));
    }

    #[tokio::test]
    async fn http_source_reports_server_errors() {
        let url = spawn_issuer("500 Internal Server Error", "{}".to_string()).await;
        let source = HttpKeySetSource::new(url, Duration::from_secs(2)).unwrap();

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, KeySetError::Http(_)));
    }

    #[tokio::test]
    async fn http_source_rejects_non_jwks_bodies() {
        let url = spawn_issuer("200 OK", "[1, 2, 3]".to_string()).await;
        let source = HttpKeySetSource::new(url, Duration::from_secs(2)).unwrap();

        assert!(matches!(source.fetch().await, Err(KeySetError::Http(_))));
    }
}
