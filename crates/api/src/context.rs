use std::sync::Arc;

use coffeeshop_auth::Claims;

/// Verified caller of a protected route.
///
/// Inserted into request extensions by the permission middleware, only after
/// the whole authorization pipeline has passed.
#[derive(Debug, Clone)]
pub struct CallerContext {
    claims: Arc<Claims>,
}

impl CallerContext {
    pub fn new(claims: Claims) -> Self {
        Self {
            claims: Arc::new(claims),
        }
    }

    /// `sub` claim, or an empty string when the token carries none.
    pub fn subject(&self) -> &str {
        self.claims.sub.as_deref().unwrap_or_default()
    }
}
