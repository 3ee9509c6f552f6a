//! Postgres-backed drink store.
//!
//! Recipes are stored as a JSONB list of ingredients. Title uniqueness is a
//! table constraint, so concurrent writers cannot both claim a title.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `DuplicateTitle` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed, Io, etc. | N/A | `Backend` |

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{FromRow, Row};
use tracing::instrument;

use async_trait::async_trait;

use coffeeshop_core::DrinkId;
use coffeeshop_drinks::{Drink, DrinkPatch, NewDrink, Recipe};

use super::r#trait::{DrinkStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS drinks (
    id      BIGSERIAL PRIMARY KEY,
    title   VARCHAR(80) NOT NULL UNIQUE,
    recipe  JSONB NOT NULL
)
"#;

/// Postgres-backed drink store.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PostgresDrinkStore {
    pool: PgPool,
}

impl PostgresDrinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }


    /// Create the `drinks` table if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl DrinkStore for PostgresDrinkStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        let rows = sqlx::query("SELECT id, title, recipe FROM drinks ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter()
            .map(|row| {
                DrinkRow::from_row(row)
                    .map(Drink::from)
                    .map_err(|e| map_sqlx_error("list", e))
            })
            .collect()
    }

    #[instrument(skip(self), fields(drink_id = %id), err)]
    async fn get(&self, id: DrinkId) -> Result<Drink, StoreError> {
        let row = sqlx::query("SELECT id, title, recipe FROM drinks WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?
            .ok_or(StoreError::NotFound(id))?;

        DrinkRow::from_row(&row)
            .map(Drink::from)
            .map_err(|e| map_sqlx_error("get", e))
    }

    #[instrument(skip(self, drink), fields(title = %drink.title), err)]
    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        let drink = drink.validate()?;

        let id: i64 = sqlx::query("INSERT INTO drinks (title, recipe) VALUES ($1, $2) RETURNING id")
            .bind(&drink.title)
            .bind(Json(&drink.recipe))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error("insert", &drink.title, e))?
            .try_get("id")
            .map_err(|e| map_sqlx_error("insert", e))?;

        tracing::info!(drink_id = id, "drink created");
        Ok(drink.into_drink(DrinkId::from_i64(id)))
    }

    /// Row-locks the drink for the duration of the read-patch-write.
    #[instrument(skip(self, patch), fields(drink_id = %id), err)]
    async fn update(&self, id: DrinkId, patch: DrinkPatch) -> Result<Drink, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        let row = sqlx::query("SELECT id, title, recipe FROM drinks WHERE id = $1 FOR UPDATE")
            .bind(id.as_i64())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update", e))?
            .ok_or(StoreError::NotFound(id))?;

        let mut drink: Drink = DrinkRow::from_row(&row)
            .map(Drink::from)
            .map_err(|e| map_sqlx_error("update", e))?;
        drink.apply(patch)?;

        sqlx::query("UPDATE drinks SET title = $2, recipe = $3 WHERE id = $1")
            .bind(id.as_i64())
            .bind(drink.title())
            .bind(Json(drink.recipe()))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error("update", drink.title(), e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("update", e))?;
        Ok(drink)
    }

    #[instrument(skip(self), fields(drink_id = %id), err)]
    async fn delete(&self, id: DrinkId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM drinks WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

struct DrinkRow {
    id: i64,
    title: String,
    recipe: Json<Recipe>,
}

impl<'r> FromRow<'r, PgRow> for DrinkRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(DrinkRow {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            recipe: row.try_get("recipe")?,
        })
    }
}

impl From<DrinkRow> for Drink {
    fn from(row: DrinkRow) -> Self {
        Drink::from_parts(DrinkId::from_i64(row.id), row.title, row.recipe.0)
    }
}

fn map_write_error(operation: &str, title: &str, err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::DuplicateTitle(title.to_string());
    }
    map_sqlx_error(operation, err)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
