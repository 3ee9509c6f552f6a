use serde::{Deserialize, Serialize};

use coffeeshop_core::{DomainError, DomainResult, DrinkId};

use crate::recipe::{LongIngredient, Recipe, ShortIngredient};

/// Longest title a drink may carry (matches the store column width).
pub const MAX_TITLE_LEN: usize = 80;

/// A drink on the menu.
///
/// # Invariants
/// - `title` is non-blank and at most [`MAX_TITLE_LEN`] characters.
/// - `recipe` is valid (see [`Recipe::validate`]).
/// - Title uniqueness across drinks is enforced by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    id: DrinkId,
    title: String,
    recipe: Recipe,
}

/// Public projection of a drink: ingredient names are hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkShort {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

/// Detailed projection of a drink, shown to authorized callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkLong {
    pub id: DrinkId,
    pub title: String,
    pub recipe: Vec<LongIngredient>,
}

impl Drink {
    /// Rehydrate a drink from stored state. Stores call this after the row
    /// has been validated on the way in.
    pub fn from_parts(id: DrinkId, title: impl Into<String>, recipe: Recipe) -> Self {
        Self {
            id,
            title: title.into(),
            recipe,
        }
    }

    pub fn id(&self) -> DrinkId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn short(&self) -> DrinkShort {
        DrinkShort {
            id: self.id,
            title: self.title.clone(),
            recipe: self.recipe.short(),
        }
    }

    pub fn long(&self) -> DrinkLong {
        DrinkLong {
            id: self.id,
            title: self.title.clone(),
            recipe: self.recipe.long(),
        }
    }

    /// Apply a partial update. Either every field in the patch is applied or
    /// none is.
    pub fn apply(&mut self, patch: DrinkPatch) -> DomainResult<()> {
        let title = match patch.title {
            Some(title) => Some(normalize_title(&title)?),
            None => None,
        };
        if let Some(recipe) = &patch.recipe {
            recipe.validate()?;
        }

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(recipe) = patch.recipe {
            self.recipe = recipe;
        }
        Ok(())
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Recipe,
}

impl NewDrink {
    /// Validate and normalize (trim the title) before handing to a store.
    pub fn validate(self) -> DomainResult<Self> {
        let title = normalize_title(&self.title)?;
        self.recipe.validate()?;
        Ok(Self {
            title,
            recipe: self.recipe,
        })
    }

    pub fn into_drink(self, id: DrinkId) -> Drink {
        Drink::from_parts(id, self.title, self.recipe)
    }
}

/// Body of a partial update request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<Recipe>,
}

fn normalize_title(title: &str) -> DomainResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}
