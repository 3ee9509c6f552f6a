//! Authorization failure model.
//!
//! Every way the gate can reject a request is a [`FailureKind`]. The kind
//! fixes the HTTP status and short code; the message is the human-readable
//! text sent back to the caller.

use std::borrow::Cow;

use thiserror::Error;

/// Position in the linear authorization pipeline.
///
/// `Unauthenticated → HeaderParsed → SignatureVerified → ClaimsValid →
/// PermissionGranted → Invoked`. A failure is terminal for the request; there
/// is no retry and no backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStage {
    Unauthenticated,
    HeaderParsed,
    SignatureVerified,
    ClaimsValid,
    PermissionGranted,
    Invoked,
}

/// Taxonomy of authorization failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// `Authorization` header absent or not a single bearer token.
    MissingOrMalformedHeader,
    /// Token header undecodable or without a key id.
    MalformedToken,
    /// No signing key with the token's key id.
    UnknownSigningKey,
    /// Signing key set could not be fetched. Reported like an unknown key.
    KeyFetchFailure,
    /// Signature did not verify, wrong algorithm, or undecodable payload.
    InvalidSignature,
    ExpiredToken,
    /// Audience or issuer missing or not the configured one.
    ClaimMismatch,
    MissingPermissionsClaim,
    InsufficientPermission,
}

impl FailureKind {
    pub fn status(self) -> u16 {
        match self {
            FailureKind::MissingPermissionsClaim => 400,
            FailureKind::InsufficientPermission => 403,
            _ => 401,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            FailureKind::MissingOrMalformedHeader
            | FailureKind::MalformedToken
            | FailureKind::UnknownSigningKey
            | FailureKind::KeyFetchFailure
            | FailureKind::InvalidSignature => "invalid_header",
            FailureKind::ExpiredToken => "token_expired",
            FailureKind::ClaimMismatch | FailureKind::MissingPermissionsClaim => "invalid_claims",
            FailureKind::InsufficientPermission => "unauthorized",
        }
    }

    /// Last stage the pipeline reached before failing with this kind.
    pub fn stage(self) -> AuthStage {
        match self {
            FailureKind::MissingOrMalformedHeader => AuthStage::Unauthenticated,
            FailureKind::MalformedToken
            | FailureKind::UnknownSigningKey
            | FailureKind::KeyFetchFailure
            | FailureKind::InvalidSignature => AuthStage::HeaderParsed,
            FailureKind::ExpiredToken | FailureKind::ClaimMismatch => AuthStage::SignatureVerified,
            FailureKind::MissingPermissionsClaim | FailureKind::InsufficientPermission => {
                AuthStage::ClaimsValid
            }
        }
    }
}

impl core::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// A rejected authorization decision: status code, short error code, message.
///
/// Immutable once constructed. The HTTP layer renders it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct AuthorizationFailure {
    kind: FailureKind,
    message: Cow<'static, str>,
}

impl AuthorizationFailure {
    pub fn new(kind: FailureKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn header_missing() -> Self {
        Self::new(FailureKind::MissingOrMalformedHeader, "Authorization header is expected.")
    }

    pub fn header_not_bearer() -> Self {
        Self::new(
            FailureKind::MissingOrMalformedHeader,
            "Authorization header must start with \"Bearer\".",
        )
    }

    pub fn token_not_found() -> Self {
        Self::new(FailureKind::MissingOrMalformedHeader, "Token not found.")
    }

    pub fn header_not_single_token() -> Self {
        Self::new(
            FailureKind::MissingOrMalformedHeader,
            "Authorization header must be bearer token.",
        )
    }

    pub fn authorization_malformed() -> Self {
        Self::new(FailureKind::MalformedToken, "Authorization malformed")
    }

    pub fn unknown_key() -> Self {
        Self::new(FailureKind::UnknownSigningKey, "Unable to find the appropriate key")
    }

    pub fn key_fetch_failed() -> Self {
        Self::new(FailureKind::KeyFetchFailure, "Unable to find the appropriate key")
    }

    pub fn unparseable_token() -> Self {
        Self::new(FailureKind::InvalidSignature, "Unable to parse authentication token")
    }

    pub fn token_expired() -> Self {
        Self::new(FailureKind::ExpiredToken, "Token expired")
    }

    pub fn claim_mismatch() -> Self {
        Self::new(
            FailureKind::ClaimMismatch,
            "Incorrect claims. Please, check the audience and issuer.",
        )
    }

    pub fn permissions_missing() -> Self {
        Self::new(FailureKind::MissingPermissionsClaim, "Permissions not included in JWT")
    }

    pub fn permission_not_found() -> Self {
        Self::new(FailureKind::InsufficientPermission, "Permission not found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_code_follow_kind() {
        let cases = [
            (AuthorizationFailure::header_missing(), 401, "invalid_header"),
            (AuthorizationFailure::authorization_malformed(), 401, "invalid_header"),
            (AuthorizationFailure::unknown_key(), 401, "invalid_header"),
            (AuthorizationFailure::key_fetch_failed(), 401, "invalid_header"),
            (AuthorizationFailure::unparseable_token(), 401, "invalid_header"),
            (AuthorizationFailure::token_expired(), 401, "token_expired"),
            (AuthorizationFailure::claim_mismatch(), 401, "invalid_claims"),
            (AuthorizationFailure::permissions_missing(), 400, "invalid_claims"),
            (AuthorizationFailure::permission_not_found(), 403, "unauthorized"),
        ];

        for (failure, status, code) in cases {
            assert_eq!(failure.status(), status, "{failure}");
            assert_eq!(failure.code(), code, "{failure}");
        }
    }

    #[test]
    fn key_fetch_failure_looks_like_unknown_key() {
        let fetch = AuthorizationFailure::key_fetch_failed();
        let unknown = AuthorizationFailure::unknown_key();
        assert_eq!(fetch.status(), unknown.status());
        assert_eq!(fetch.code(), unknown.code());
        assert_eq!(fetch.message(), unknown.message());
        assert_ne!(fetch.kind(), unknown.kind());
    }

    #[test]
    fn display_includes_code_and_message() {
        assert_eq!(
            AuthorizationFailure::token_expired().to_string(),
            "token_expired: Token expired"
        );
    }

    #[test]
    fn stages_are_ordered_along_the_pipeline() {
        assert_eq!(FailureKind::MissingOrMalformedHeader.stage(), AuthStage::Unauthenticated);
        assert_eq!(FailureKind::UnknownSigningKey.stage(), AuthStage::HeaderParsed);
        assert_eq!(FailureKind::ExpiredToken.stage(), AuthStage::SignatureVerified);
        assert_eq!(FailureKind::InsufficientPermission.stage(), AuthStage::ClaimsValid);
    }
}
