use sqlx::{Pool, Sqlite};

use crate::{
    error::{Error, QueryError},
    schema::{Id, ShoppingListItem},
};

pub async fn has_cart_items(user_id: Id, pool: &Pool<Sqlite>) -> Result<bool, Error> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shopping_cart WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(exists)
}

/// Ingredients of every recipe in the user's cart, summed per (name, unit).
pub async fn fetch_shopping_list(
    user_id: Id,
    pool: &Pool<Sqlite>,
) -> Result<Vec<ShoppingListItem>, Error> {
    let rows: Vec<ShoppingListItem> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, SUM(ri.amount) AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name, i.measurement_unit
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

/// One `<name> <amount> - (<unit>)` line per item.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} {} - ({})\n", item.name, item.amount, item.measurement_unit))
        .collect()
}
