use sqlx::{Pool, Sqlite};

use crate::{
    error::{Error, HtmlError, QueryError},
    pagination::PageRequest,
    schema::{Id, User, UserRow},
};

pub async fn follow_author(user_id: Id, author_id: Id, pool: &Pool<Sqlite>) -> Result<(), Error> {
    if user_id == author_id {
        return Err(HtmlError::InvalidRequest.new("You can't subscribe to yourself"));
    }

    let result = sqlx::query(
        "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        log::debug!("User {user_id} is already following {author_id}");
        return Err(HtmlError::InvalidRequest.new("You are already subscribed to this author"));
    }

    Ok(())
}

pub async fn unfollow_author(user_id: Id, author_id: Id, pool: &Pool<Sqlite>) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        log::debug!("User {user_id} is not following {author_id}");
        return Err(HtmlError::InvalidRequest.new("You are not subscribed to this author"));
    }

    Ok(())
}

pub async fn is_following(user_id: Id, author_id: Id, pool: &Pool<Sqlite>) -> Result<bool, Error> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2)",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(exists)
}

/// Authors `user_id` follows, ordered by id, with the total count.
pub async fn fetch_followed_authors(
    user_id: Id,
    page: PageRequest,
    pool: &Pool<Sqlite>,
) -> Result<(Vec<User>, i64), Error> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(*) OVER() AS count FROM follows f
        INNER JOIN users u ON u.id = f.author_id
        WHERE f.user_id = $1
        ORDER BY u.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok((rows.into_iter().map(User::from).collect(), total_count))
}
