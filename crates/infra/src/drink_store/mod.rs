//! Drink persistence boundary.
//!
//! Handlers talk to a [`DrinkStore`]; which backend sits behind it is decided
//! once at startup.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryDrinkStore;
pub use postgres::PostgresDrinkStore;
pub use r#trait::{DrinkStore, StoreError};
