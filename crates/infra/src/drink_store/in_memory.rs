use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use coffeeshop_core::DrinkId;
use coffeeshop_drinks::{Drink, DrinkPatch, NewDrink};

use super::r#trait::{DrinkStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    drinks: BTreeMap<DrinkId, Drink>,
}

impl Inner {
    fn title_taken(&self, title: &str, except: Option<DrinkId>) -> bool {
        self.drinks
            .values()
            .any(|d| d.title() == title && Some(d.id()) != except)
    }
}

/// In-memory drink store.
///
/// Intended for tests/dev. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct InMemoryDrinkStore {
    inner: RwLock<Inner>,
}

impl InMemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `drinks`, inserted in order.
    pub fn seeded(drinks: impl IntoIterator<Item = NewDrink>) -> Result<Self, StoreError> {
        let store = Self::new();
        {
            let mut inner = store.write()?;
            for drink in drinks {
                Self::insert_locked(&mut inner, drink)?;
            }
        }
        Ok(store)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn insert_locked(inner: &mut Inner, drink: NewDrink) -> Result<Drink, StoreError> {
        let drink = drink.validate()?;
        if inner.title_taken(&drink.title, None) {
            return Err(StoreError::DuplicateTitle(drink.title));
        }

        inner.last_id += 1;
        let drink = drink.into_drink(DrinkId::from_i64(inner.last_id));
        inner.drinks.insert(drink.id(), drink.clone());
        Ok(drink)
    }
}

#[async_trait]
impl DrinkStore for InMemoryDrinkStore {
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        Ok(self.read()?.drinks.values().cloned().collect())
    }

    async fn get(&self, id: DrinkId) -> Result<Drink, StoreError> {
        self.read()?
            .drinks
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        let mut inner = self.write()?;
        Self::insert_locked(&mut inner, drink)
    }

    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError> {
        let mut inner = self.write()?;
        let mut updated = inner.drinks.get(&id).cloned().ok_or(StoreError::NotFound(id))?;
        updated.apply(patch)?;

        if inner.title_taken(updated.title(), Some(id)) {
            return Err(StoreError::DuplicateTitle(updated.title().to_string()));
        }
        inner.drinks.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: DrinkId) -> Result<(), StoreError> {
        self.write()?
            .drinks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
