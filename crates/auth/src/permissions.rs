use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{AuthorizationFailure, Claims};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "post:drinks"). A route
/// fixes its required permission at registration time; it is never derived
/// from request data.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Check that verified claims grant `required`.
///
/// - No IO
/// - No panics
/// - Exact string membership, no wildcards
pub fn check_permissions(claims: &Claims, required: &Permission) -> Result<(), AuthorizationFailure> {
    let permissions = claims
        .permissions
        .as_ref()
        .ok_or_else(AuthorizationFailure::permissions_missing)?;

    if permissions.contains(required) {
        Ok(())
    } else {
        Err(AuthorizationFailure::permission_not_found())
    }
}
