use sqlx::{Pool, Sqlite};

use crate::{
    error::{Error, QueryError},
    schema::{Id, Ingredient, RecipePart},
};

use super::missing_ids;

/// Inserts an ingredient unless the (name, unit) pair exists. Returns whether it was inserted.
pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Sqlite>,
) -> Result<bool, Error> {
    let result = sqlx::query(
        "
        INSERT INTO ingredients (name, measurement_unit, search_name)
        VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .bind(name.to_lowercase())
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Sqlite>) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> =
        sqlx::query_as("SELECT id, name, measurement_unit FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row)
}

/// Case-insensitive prefix search; `None` lists everything.
pub async fn list_ingredients(
    prefix: Option<&str>,
    pool: &Pool<Sqlite>,
) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> = match prefix {
        Some(prefix) => {
            sqlx::query_as(
                "
                SELECT id, name, measurement_unit FROM ingredients
                WHERE search_name LIKE $1 ESCAPE '\\'
                ORDER BY name
            ",
            )
            .bind(format!("{}%", escape_like(&prefix.to_lowercase())))
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?
        }
        None => sqlx::query_as("SELECT id, name, measurement_unit FROM ingredients ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?,
    };

    Ok(rows)
}

pub async fn missing_ingredient_ids(ids: &[Id], pool: &Pool<Sqlite>) -> Result<Vec<Id>, Error> {
    missing_ids("ingredients", ids, pool).await
}

pub async fn list_recipe_parts(recipe_id: Id, pool: &Pool<Sqlite>) -> Result<Vec<RecipePart>, Error> {
    let rows: Vec<RecipePart> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
