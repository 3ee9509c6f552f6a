use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Permission;

/// `aud` may be a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|a| a == audience),
        }
    }
}

/// Claims of a verified access token.
///
/// Only the verifier constructs these from a token, and only after the
/// signature, expiry, audience and issuer checks have all passed. Claims this
/// type does not name are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub aud: Audience,
    /// Expiration time (seconds since epoch).
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Granted permissions; duplicates collapse. `None` when the claim is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<Permission>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|granted| granted.contains(permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_permissions_collapse() {
        let claims: Claims = serde_json::from_value(json!({
            "iss": "https://issuer.test/",
            "aud": "drinks",
            "exp": 1,
            "permissions": ["post:drinks", "post:drinks", "get:drinks-detail"]
        }))
        .unwrap();

        assert_eq!(claims.permissions.as_ref().map(|p| p.len()), Some(2));
        assert!(claims.has_permission(&Permission::new("post:drinks")));
    }

    #[test]
    fn audience_accepts_list() {
        let claims: Claims = serde_json::from_value(json!({
            "iss": "https://issuer.test/",
            "aud": ["drinks", "https://issuer.test/userinfo"],
            "exp": 1
        }))
        .unwrap();

        assert!(claims.aud.contains("drinks"));
        assert!(!claims.aud.contains("kitchen"));
        assert!(claims.permissions.is_none());
    }

    #[test]
    fn unknown_claims_survive_round_trip() {
        let value = json!({
            "iss": "https://issuer.test/",
            "aud": "drinks",
            "exp": 1,
            "azp": "client-123",
            "scope": "openid"
        });
        let claims: Claims = serde_json::from_value(value.clone()).unwrap();

        assert_eq!(claims.extra["azp"], "client-123");
        assert_eq!(serde_json::to_value(&claims).unwrap(), value);
    }
}
