use axum::{
    middleware::from_fn_with_state,
    routing::{MethodRouter, delete, get, patch, post},
    Router,
};

use coffeeshop_auth::AuthorizationGate;

use crate::middleware::require_permission;

pub mod drinks;
pub mod system;

/// Wrap `route` so it only runs for callers holding `permission`.
fn guarded(route: MethodRouter, gate: &AuthorizationGate, permission: &'static str) -> MethodRouter {
    route.route_layer(from_fn_with_state(gate.require(permission), require_permission))
}

/// Router for every endpoint.
///
/// | Route | Permission |
/// |-------|------------|
/// | `GET /drinks` | public |
/// | `GET /drinks-detail` | `get:drinks-detail` |
/// | `POST /drinks` | `post:drinks` |
/// | `PATCH /drinks/:id` | `patch:drinks` |
/// | `DELETE /drinks/:id` | `delete:drinks` |
pub fn router(gate: &AuthorizationGate) -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route(
            "/drinks",
            get(drinks::list_drinks).merge(guarded(post(drinks::create_drink), gate, "post:drinks")),
        )
        .route(
            "/drinks-detail",
            guarded(get(drinks::list_drinks_detail), gate, "get:drinks-detail"),
        )
        .route(
            "/drinks/:id",
            guarded(patch(drinks::update_drink), gate, "patch:drinks")
                .merge(guarded(delete(drinks::delete_drink), gate, "delete:drinks")),
        )
}
