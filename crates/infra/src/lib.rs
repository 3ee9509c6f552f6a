//! Infrastructure layer: drink persistence.

pub mod drink_store;

pub use drink_store::{DrinkStore, InMemoryDrinkStore, PostgresDrinkStore, StoreError};
