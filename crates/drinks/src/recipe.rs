use serde::{Deserialize, Serialize};

use coffeeshop_core::{DomainError, DomainResult, ValueObject};

/// One layer of a drink: a named ingredient, its display color and how many
/// parts of the cup it fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

impl ValueObject for Ingredient {}

impl Ingredient {
    pub fn new(name: impl Into<String>, color: impl Into<String>, parts: u32) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            parts,
        }
    }

    fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("ingredient name must not be empty"));
        }
        if self.color.trim().is_empty() {
            return Err(DomainError::validation("ingredient color must not be empty"));
        }
        if self.parts == 0 {
            return Err(DomainError::validation(format!(
                "ingredient '{}' must fill at least one part",
                self.name
            )));
        }
        Ok(())
    }
}

/// Ingredient as shown in the public ("short") view: no names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

/// Ingredient as shown in the detailed ("long") view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongIngredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// Ordered list of ingredients, bottom of the cup first.
///
/// Request bodies may carry either a single ingredient object or a list; both
/// deserialize into a `Recipe`. Serialization always produces a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecipeRepr", into = "Vec<Ingredient>")]
pub struct Recipe(Vec<Ingredient>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipeRepr {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl From<RecipeRepr> for Recipe {
    fn from(value: RecipeRepr) -> Self {
        match value {
            RecipeRepr::Many(items) => Self(items),
            RecipeRepr::One(item) => Self(vec![item]),
        }
    }
}

impl From<Recipe> for Vec<Ingredient> {
    fn from(value: Recipe) -> Self {
        value.0
    }
}

impl ValueObject for Recipe {}

impl Recipe {
    pub fn new(ingredients: Vec<Ingredient>) -> Self {
        Self(ingredients)
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.0
    }

    /// A recipe needs at least one ingredient and every ingredient must be
    /// named, colored and fill a positive number of parts.
    pub fn validate(&self) -> DomainResult<()> {
        if self.0.is_empty() {
            return Err(DomainError::validation("recipe must contain at least one ingredient"));
        }
        self.0.iter().try_for_each(Ingredient::validate)
    }

    pub fn short(&self) -> Vec<ShortIngredient> {
        self.0
            .iter()
            .map(|i| ShortIngredient {
                color: i.color.clone(),
                parts: i.parts,
            })
            .collect()
    }

    pub fn long(&self) -> Vec<LongIngredient> {
        self.0
            .iter()
            .map(|i| LongIngredient {
                name: i.name.clone(),
                color: i.color.clone(),
                parts: i.parts,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_list_of_ingredients() {
        let recipe: Recipe = serde_json::from_value(json!([
            {"name": "milk", "color": "white", "parts": 1},
            {"name": "espresso", "color": "brown", "parts": 2}
        ]))
        .unwrap();

        assert_eq!(recipe.ingredients().len(), 2);
        assert_eq!(recipe.ingredients()[1].name, "espresso");
    }

    #[test]
    fn deserializes_single_ingredient_object() {
        let recipe: Recipe =
            serde_json::from_value(json!({"name": "water", "color": "blue", "parts": 1})).unwrap();

        assert_eq!(recipe.ingredients(), &[Ingredient::new("water", "blue", 1)]);
    }

    #[test]
    fn serializes_as_list() {
        let recipe = Recipe::new(vec![Ingredient::new("water", "blue", 1)]);
        let value = serde_json::to_value(&recipe).unwrap();
        assert_eq!(value, json!([{"name": "water", "color": "blue", "parts": 1}]));
    }

    #[test]
    fn empty_recipe_is_invalid() {
        let err = Recipe::new(vec![]).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn zero_parts_is_invalid() {
        let recipe = Recipe::new(vec![Ingredient::new("water", "blue", 0)]);
        assert!(recipe.validate().is_err());
    }

    #[test]
    fn blank_color_is_invalid() {
        let recipe = Recipe::new(vec![Ingredient::new("water", "  ", 1)]);
        assert!(recipe.validate().is_err());
    }

    #[test]
    fn short_view_drops_names() {
        let recipe = Recipe::new(vec![Ingredient::new("secret syrup", "amber", 3)]);
        let short = serde_json::to_value(recipe.short()).unwrap();
        assert_eq!(short, json!([{"color": "amber", "parts": 3}]));
    }
}
