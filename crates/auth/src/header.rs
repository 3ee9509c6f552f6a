//! Bearer header parsing.
//!
//! Nothing here looks inside the token; decoding its segments is the
//! verifier's job.

use crate::AuthorizationFailure;

/// Extract the raw token from an `Authorization` header value.
///
/// The value must be exactly `<scheme> <token>` with the scheme `Bearer`
/// (compared ASCII case-insensitively). The token is returned unchanged.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthorizationFailure> {
    let header = header.ok_or_else(AuthorizationFailure::header_missing)?;

    let mut parts = header.split_whitespace();
    let scheme = parts.next().ok_or_else(AuthorizationFailure::header_missing)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthorizationFailure::header_not_bearer());
    }

    let token = parts.next().ok_or_else(AuthorizationFailure::token_not_found)?;
    if parts.next().is_some() {
        return Err(AuthorizationFailure::header_not_single_token());
    }

    Ok(token)
}
