use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use coffeeshop_auth::{AuthorizationFailure, RequirePermission};

use crate::app::errors::ApiError;
use crate::context::CallerContext;

/// Route guard: runs the authorization pipeline for the route's permission
/// and hands the request on, with a [`CallerContext`] attached, only if it
/// passes.
///
/// Registered per route with `from_fn_with_state(gate.require(..), require_permission)`.
pub async fn require_permission(
    State(guard): State<RequirePermission>,
    mut req: Request,
    next: Next,
) -> Response {
    let header = match req.headers().get(AUTHORIZATION).map(|v| v.to_str()) {
        None => None,
        Some(Ok(value)) => Some(value.to_owned()),
        // Not visible ASCII, so it cannot be a bearer credential.
        Some(Err(_)) => return ApiError::from(AuthorizationFailure::header_not_bearer()).into_response(),
    };

    let outcome = guard
        .authorize(header.as_deref(), |claims| async move {
            req.extensions_mut().insert(CallerContext::new(claims));
            next.run(req).await
        })
        .await;

    match outcome {
        Ok(response) => response,
        Err(failure) => ApiError::from(failure).into_response(),
    }
}
