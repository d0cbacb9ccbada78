use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    error::{Error, QueryError},
    filter::RecipeFilter,
    pagination::PageRequest,
    schema::{Id, IngredientAmount, Recipe, RecipeChanges, RecipeDraft, RecipeRow},
};

/// One page of recipes matching `filter`, newest first, with the total match count.
pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Id>,
    page: PageRequest,
    pool: &Pool<Sqlite>,
) -> Result<(Vec<Recipe>, i64), Error> {
    let mut builder =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE 1 = 1");
    filter.push_conditions(&mut builder, viewer);
    builder
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows: Vec<RecipeRow> = builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok((rows.into_iter().map(Recipe::from).collect(), total_count))
}

pub async fn get_recipe(id: Id, pool: &Pool<Sqlite>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Whether `author_id` already has a recipe called `name`, other than `except`.
pub async fn recipe_name_taken(
    author_id: Id,
    name: &str,
    except: Option<Id>,
    pool: &Pool<Sqlite>,
) -> Result<bool, Error> {
    let row: Option<(Id,)> =
        sqlx::query_as("SELECT id FROM recipes WHERE author_id = $1 AND name = $2 AND id IS NOT $3")
            .bind(author_id)
            .bind(name)
            .bind(except)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row.is_some())
}

/// Writes the recipe with its tags and ingredients in one transaction.
pub async fn create_recipe(
    author_id: Id,
    draft: &RecipeDraft,
    pool: &Pool<Sqlite>,
) -> Result<Recipe, Error> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let recipe: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time, pub_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
    ",
    )
    .bind(author_id)
    .bind(&draft.name)
    .bind(&draft.image)
    .bind(&draft.text)
    .bind(draft.cooking_time)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    attach_tags(&mut tx, recipe.id, &draft.tags).await?;
    attach_ingredients(&mut tx, recipe.id, &draft.ingredients).await?;

    tx.commit().await.map_err(QueryError::from)?;

    log::info!("Created recipe {} ({}) by {}", recipe.name, recipe.id, author_id);
    Ok(recipe)
}

/// Applies `changes` to `recipe`. Supplied tag and ingredient lists replace the stored ones.
pub async fn update_recipe(
    recipe: &Recipe,
    changes: &RecipeChanges,
    pool: &Pool<Sqlite>,
) -> Result<Recipe, Error> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let updated: Recipe = sqlx::query_as(
        "
        UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4
        WHERE id = $5
        RETURNING *
    ",
    )
    .bind(changes.name.as_deref().unwrap_or(&recipe.name))
    .bind(changes.image.as_deref().unwrap_or(&recipe.image))
    .bind(changes.text.as_deref().unwrap_or(&recipe.text))
    .bind(changes.cooking_time.unwrap_or(recipe.cooking_time))
    .bind(recipe.id)
    .fetch_one(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    if let Some(tags) = &changes.tags {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(recipe.id)
            .execute(&mut *tx)
            .await
            .map_err(QueryError::from)?;
        attach_tags(&mut tx, recipe.id, tags).await?;
    }

    if let Some(ingredients) = &changes.ingredients {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe.id)
            .execute(&mut *tx)
            .await
            .map_err(QueryError::from)?;
        attach_ingredients(&mut tx, recipe.id, ingredients).await?;
    }

    tx.commit().await.map_err(QueryError::from)?;

    log::info!("Updated recipe {}", recipe.id);
    Ok(updated)
}

/// Deletes the recipe; join and edge rows go with it. Returns whether a row was removed.
pub async fn delete_recipe(id: Id, pool: &Pool<Sqlite>) -> Result<bool, Error> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(result.rows_affected() > 0)
}

/// The author's recipes, newest first, at most `limit` of them.
pub async fn fetch_author_recipes(
    author_id: Id,
    limit: Option<i64>,
    pool: &Pool<Sqlite>,
) -> Result<Vec<Recipe>, Error> {
    let rows: Vec<Recipe> = sqlx::query_as(
        "SELECT * FROM recipes WHERE author_id = $1 ORDER BY pub_date DESC, id DESC LIMIT $2",
    )
    .bind(author_id)
    .bind(limit.unwrap_or(-1))
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn count_author_recipes(author_id: Id, pool: &Pool<Sqlite>) -> Result<i64, Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(count)
}

async fn attach_tags(conn: &mut SqliteConnection, recipe_id: Id, tags: &[Id]) -> Result<(), Error> {
    for tag_id in tags {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .map_err(QueryError::from)?;
    }

    Ok(())
}

async fn attach_ingredients(
    conn: &mut SqliteConnection,
    recipe_id: Id,
    ingredients: &[IngredientAmount],
) -> Result<(), Error> {
    for part in ingredients {
        sqlx::query(
            "
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
            VALUES ($1, $2, $3)
            ON CONFLICT (recipe_id, ingredient_id) DO UPDATE SET amount = excluded.amount
        ",
        )
        .bind(recipe_id)
        .bind(part.id)
        .bind(part.amount)
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;
    }

    Ok(())
}
