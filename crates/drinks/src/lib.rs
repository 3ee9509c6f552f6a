//! Drinks domain module.
//!
//! This crate contains the business rules for the drink menu, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod drink;
pub mod recipe;

pub use drink::{Drink, DrinkLong, DrinkPatch, DrinkShort, NewDrink, MAX_TITLE_LEN};
pub use recipe::{Ingredient, LongIngredient, Recipe, ShortIngredient};
