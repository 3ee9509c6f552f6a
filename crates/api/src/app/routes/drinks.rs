use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    Json,
};

use coffeeshop_core::DrinkId;
use coffeeshop_drinks::{DrinkLong, DrinkPatch, DrinkShort, NewDrink};

use crate::app::dto::{DeletedResponse, DrinksResponse};
use crate::app::errors::ApiError;
use crate::app::SharedStore;
use crate::context::CallerContext;

/// Public menu: every drink in the short view.
pub async fn list_drinks(
    Extension(store): Extension<SharedStore>,
) -> Result<Json<DrinksResponse<DrinkShort>>, ApiError> {
    let drinks = store.list().await?;
    Ok(Json(DrinksResponse::new(drinks.iter().map(|d| d.short()).collect())))
}

pub async fn list_drinks_detail(
    Extension(store): Extension<SharedStore>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<DrinksResponse<DrinkLong>>, ApiError> {
    let drinks = store.list().await?;
    tracing::debug!(sub = caller.subject(), count = drinks.len(), "listing drink details");
    Ok(Json(DrinksResponse::new(drinks.iter().map(|d| d.long()).collect())))
}

pub async fn create_drink(
    Extension(store): Extension<SharedStore>,
    Extension(caller): Extension<CallerContext>,
    body: Result<Json<NewDrink>, JsonRejection>,
) -> Result<Json<DrinksResponse<DrinkLong>>, ApiError> {
    let Json(new_drink) = body?;
    let drink = store.insert(new_drink).await?;

    tracing::info!(
        sub = caller.subject(),
        drink_id = %drink.id(),
        title = drink.title(),
        "drink created"
    );
    Ok(Json(DrinksResponse::new(vec![drink.long()])))
}

pub async fn update_drink(
    Extension(store): Extension<SharedStore>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<DrinkPatch>, JsonRejection>,
) -> Result<Json<DrinksResponse<DrinkLong>>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = body?;
    let drink = store.update(DrinkId::from_i64(id), patch).await?;

    tracing::info!(sub = caller.subject(), drink_id = id, "drink updated");
    Ok(Json(DrinksResponse::new(vec![drink.long()])))
}

pub async fn delete_drink(
    Extension(store): Extension<SharedStore>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let Path(id) = id?;
    let id = DrinkId::from_i64(id);
    store.delete(id).await?;

    tracing::info!(sub = caller.subject(), drink_id = %id, "drink deleted");
    Ok(Json(DeletedResponse::new(id)))
}
