use std::future::Future;
use std::sync::Arc;

use crate::header::extract_bearer;
use crate::permissions::check_permissions;
use crate::{AuthStage, AuthorizationFailure, Claims, Permission, TokenVerifier};

/// Guard composing header parsing, token verification and the permission
/// check in front of a protected operation.
///
/// Cheap to clone; clones share the verifier and its key-set cache.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    verifier: Arc<TokenVerifier>,
}

impl AuthorizationGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Run the pipeline up to `PermissionGranted` and return the verified
    /// claims.
    #[tracing::instrument(skip_all, fields(permission = %required))]
    pub async fn check(
        &self,
        authorization: Option<&str>,
        required: &Permission,
    ) -> Result<Claims, AuthorizationFailure> {
        match self.run(authorization, required).await {
            Ok(claims) => {
                tracing::debug!(
                    stage = ?AuthStage::PermissionGranted,
                    sub = claims.sub.as_deref().unwrap_or_default(),
                    "authorization granted"
                );
                Ok(claims)
            }
            Err(failure) => {
                tracing::warn!(
                    stage = ?failure.kind().stage(),
                    status = failure.status(),
                    code = failure.code(),
                    reason = failure.message(),
                    "authorization rejected"
                );
                Err(failure)
            }
        }
    }

    /// Authorize and, on success, invoke `operation` exactly once with the
    /// verified claims.
    ///
    /// A failure at any stage is returned untouched and `operation` is never
    /// called.
    pub async fn authorize<F, Fut, T>(
        &self,
        authorization: Option<&str>,
        required: &Permission,
        operation: F,
    ) -> Result<T, AuthorizationFailure>
    where
        F: FnOnce(Claims) -> Fut,
        Fut: Future<Output = T>,
    {
        let claims = self.check(authorization, required).await?;
        tracing::trace!(stage = ?AuthStage::Invoked, permission = %required);
        Ok(operation(claims).await)
    }

    /// Bind this gate to one required permission (one per route).
    pub fn require(&self, permission: impl Into<Permission>) -> RequirePermission {
        RequirePermission {
            gate: self.clone(),
            permission: permission.into(),
        }
    }

    async fn run(
        &self,
        authorization: Option<&str>,
        required: &Permission,
    ) -> Result<Claims, AuthorizationFailure> {
        let token = extract_bearer(authorization)?;
        let claims = self.verifier.verify(token).await?;
        check_permissions(&claims, required)?;
        Ok(claims)
    }
}

/// A gate fixed to the permission of a single route.
#[derive(Debug, Clone)]
pub struct RequirePermission {
    gate: AuthorizationGate,
    permission: Permission,
}

impl RequirePermission {
    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    pub async fn check(&self, authorization: Option<&str>) -> Result<Claims, AuthorizationFailure> {
        self.gate.check(authorization, &self.permission).await
    }

    pub async fn authorize<F, Fut, T>(
        &self,
        authorization: Option<&str>,
        operation: F,
    ) -> Result<T, AuthorizationFailure>
    where
        F: FnOnce(Claims) -> Fut,
        Fut: Future<Output = T>,
    {
        self.gate
            .authorize(authorization, &self.permission, operation)
            .await
    }
}
