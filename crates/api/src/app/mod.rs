//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use coffeeshop_auth::AuthorizationGate;
use coffeeshop_infra::DrinkStore;

pub mod dto;
pub mod errors;
pub mod routes;

/// Store handle shared by all handlers.
pub type SharedStore = Arc<dyn DrinkStore>;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
///
/// Each protected route carries its own permission guard; see
/// [`routes::router`].
pub fn build_app(gate: AuthorizationGate, store: SharedStore) -> Router {
    routes::router(&gate)
        .fallback(routes::system::not_found)
        .layer(ServiceBuilder::new().layer(Extension(store)))
}
