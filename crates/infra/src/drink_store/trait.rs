use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use coffeeshop_core::{DomainError, DrinkId};
use coffeeshop_drinks::{Drink, DrinkPatch, NewDrink};

/// Errors returned by a [`DrinkStore`].
///
/// - **NotFound**: no drink with the given id
/// - **DuplicateTitle**: another drink already uses the title
/// - **Invalid**: the drink breaks an entity rule
/// - **Backend**: the storage itself failed
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("drink {0} not found")]
    NotFound(DrinkId),

    #[error("a drink titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error("invalid drink: {0}")]
    Invalid(#[from] DomainError),

    #[error("storage failure: {0}")]
    Backend(String),
}

/// Persistent collection of drinks.
///
/// ## Semantics
///
/// - `list` returns every drink ordered by id.
/// - `insert` validates the drink and assigns the next id.
/// - `update` applies a patch atomically: the stored drink is either fully
///   replaced by the patched one or left untouched.
/// - Titles are unique across the collection (exact, case-sensitive match).
#[async_trait]
pub trait DrinkStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Drink>, StoreError>;

    async fn get(&self, id: DrinkId) -> Result<Drink, StoreError>;

    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError>;

    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError>;

    async fn delete(&self, id: DrinkId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> DrinkStore for Arc<S>
where
    S: DrinkStore + ?Sized,
{
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        (**self).list().await
    }

    async fn get(&self, id: DrinkId) -> Result<Drink, StoreError> {
        (**self).get(id).await
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        (**self).insert(drink).await
    }

    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: DrinkId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}
