//! `coffeeshop-auth`: bearer-token authorization for protected operations.
//!
//! The pipeline is linear: parse the `Authorization` header, verify the
//! token signature against the issuer's published keys, validate the
//! standard claims, then check the route's required permission. Only when
//! every stage passes does the guarded operation run, and it receives the
//! verified claims.
//!
//! Nothing here knows about HTTP frameworks or storage.

pub mod authorize;
pub mod claims;
pub mod config;
pub mod error;
pub mod header;
pub mod jwks;
pub mod key_cache;
pub mod permissions;
pub mod verify;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use authorize::{AuthorizationGate, RequirePermission};
pub use claims::{Audience, Claims};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthStage, AuthorizationFailure, FailureKind};
pub use header::extract_bearer;
pub use jwks::{HttpKeySetSource, KeySetError, KeySetSource, SigningKeySet, StaticKeySetSource};
pub use key_cache::KeySetCache;
pub use permissions::{Permission, check_permissions};
pub use verify::TokenVerifier;
