//! Domain building blocks shared by the coffee shop crates.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::DrinkId;
pub use value_object::ValueObject;
