use crate::{
    error::{Error, QueryError},
    schema::{Id, Tag},
};

use sqlx::{Pool, Sqlite};

use super::missing_ids;

/// Inserts a tag unless its name, color or slug is already taken. Returns whether it was inserted.
pub async fn create_tag(name: &str, color: &str, slug: &str, pool: &Pool<Sqlite>) -> Result<bool, Error> {
    let result = sqlx::query(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
    )
    .bind(name)
    .bind(color)
    .bind(slug)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_tag(id: Id, pool: &Pool<Sqlite>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Sqlite>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn list_recipe_tags(recipe_id: Id, pool: &Pool<Sqlite>) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.* FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn missing_tag_ids(ids: &[Id], pool: &Pool<Sqlite>) -> Result<Vec<Id>, Error> {
    missing_ids("tags", ids, pool).await
}
