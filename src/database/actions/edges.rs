use sqlx::{Pool, Sqlite};

use crate::{
    error::{Error, HtmlError, QueryError},
    schema::{Edge, Id},
};

/// Inserts the edge in one statement; the primary key makes a second insert a no-op,
/// which is reported as a client error.
pub async fn add_edge(edge: Edge, user_id: Id, recipe_id: Id, pool: &Pool<Sqlite>) -> Result<(), Error> {
    let sql = format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        edge.table()
    );
    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        log::debug!("User {user_id} re-added recipe {recipe_id} to {}", edge.table());
        return Err(HtmlError::InvalidRequest.new(edge.duplicate_message()));
    }

    Ok(())
}

pub async fn remove_edge(
    edge: Edge,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<(), Error> {
    let sql = format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        edge.table()
    );
    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        log::debug!("User {user_id} removed absent recipe {recipe_id} from {}", edge.table());
        return Err(HtmlError::InvalidRequest.new(edge.missing_message()));
    }

    Ok(())
}

pub async fn has_edge(edge: Edge, user_id: Id, recipe_id: Id, pool: &Pool<Sqlite>) -> Result<bool, Error> {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND recipe_id = $2)",
        edge.table()
    );
    let exists: bool = sqlx::query_scalar(&sql)
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(exists)
}
