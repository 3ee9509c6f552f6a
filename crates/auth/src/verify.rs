//! Signature and standard-claim verification.

use std::sync::Arc;

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Validation, decode, decode_header};
use serde_json::{Map, Value};

use crate::jwks::{KeySetError, SigningKey};
use crate::key_cache::KeySetCache;
use crate::{AuthConfig, AuthorizationFailure, Claims};

/// Verifies bearer tokens against the issuer's signing keys.
///
/// Shared across requests; the only state it touches is the key-set cache.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    config: Arc<AuthConfig>,
    keys: Arc<KeySetCache>,
}

impl TokenVerifier {
    pub fn new(config: AuthConfig, keys: Arc<KeySetCache>) -> Self {
        Self {
            config: Arc::new(config),
            keys,
        }
    }

    pub fn keys(&self) -> &Arc<KeySetCache> {
        &self.keys
    }

    /// Verify `token` and return its claims.
    ///
    /// 1. read `kid` from the unverified header
    /// 2. find the signing key with that id
    /// 3. check the signature with the key's algorithm family
    /// 4. check `exp`, `aud` and `iss`
    #[tracing::instrument(skip_all, fields(kid))]
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthorizationFailure> {
        let header = decode_header(token).map_err(|_| AuthorizationFailure::authorization_malformed())?;
        let kid = header
            .kid
            .ok_or_else(AuthorizationFailure::authorization_malformed)?;
        tracing::Span::current().record("kid", kid.as_str());

        let key = self.keys.key(&kid).await.map_err(|e| match e {
            KeySetError::UnknownKey { .. } => AuthorizationFailure::unknown_key(),
            KeySetError::Http(_) | KeySetError::Timeout(_) | KeySetError::Unavailable(_) => {
                AuthorizationFailure::key_fetch_failed()
            }
        })?;

        let validation = self.validation_for(&key)?;
        let data = decode::<Map<String, Value>>(token, key.decoding_key(), &validation)
            .map_err(map_jwt_error)?;

        serde_json::from_value(Value::Object(data.claims)).map_err(|e| {
            tracing::debug!(error = %e, "verified token has unexpected claim types");
            AuthorizationFailure::unparseable_token()
        })
    }

    fn validation_for(&self, key: &SigningKey) -> Result<Validation, AuthorizationFailure> {
        let algorithms: Vec<_> = self
            .config
            .algorithms
            .iter()
            .copied()
            .filter(|alg| key.family().supports(*alg))
            .collect();
        let Some(first) = algorithms.first().copied() else {
            tracing::warn!(
                kid = key.kid(),
                family = ?key.family(),
                "signing key family matches no configured algorithm"
            );
            return Err(AuthorizationFailure::unparseable_token());
        };

        let mut validation = Validation::new(first);
        validation.algorithms = algorithms;
        validation.leeway = self.config.leeway_secs;
        validation.validate_exp = true;
        validation.set_audience(&[self.config.audience.as_str()]);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        Ok(validation)
    }
}

fn map_jwt_error(err: JwtError) -> AuthorizationFailure {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthorizationFailure::token_expired(),
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => AuthorizationFailure::claim_mismatch(),
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" || claim == "iss" => {
            AuthorizationFailure::claim_mismatch()
        }
        _ => {
            tracing::debug!(error = %err, "token rejected");
            AuthorizationFailure::unparseable_token()
        }
    }
}
