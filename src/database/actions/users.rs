use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::SessionSigner,
    },
    error::{Error, FieldErrors, HtmlError, QueryError},
    pagination::PageRequest,
    schema::{Id, NewUser, User, UserRole, UserRow},
};

pub async fn get_user_by_id(user_id: Id, pool: &Pool<Sqlite>) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_by_email(email: &str, pool: &Pool<Sqlite>) -> Result<Option<User>, Error> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn fetch_users(
    page: PageRequest,
    pool: &Pool<Sqlite>,
) -> Result<(Vec<User>, i64), Error> {
    let rows: Vec<UserRow> =
        sqlx::query_as("SELECT u.*, COUNT(*) OVER() AS count FROM users u ORDER BY u.id LIMIT $1 OFFSET $2")
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok((rows.into_iter().map(User::from).collect(), total_count))
}

/// Stores a user whose `password` is still plain text; it is hashed here.
pub async fn register_user(new_user: &NewUser, pool: &Pool<Sqlite>) -> Result<User, Error> {
    let taken: Vec<(String, String)> =
        sqlx::query_as("SELECT username, email FROM users WHERE username = $1 OR email = $2")
            .bind(&new_user.username)
            .bind(&new_user.email)
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    let mut fields = FieldErrors::new();
    for (username, email) in &taken {
        if *username == new_user.username {
            fields
                .entry("username".into())
                .or_default()
                .push("A user with that username already exists.".into());
        }
        if *email == new_user.email {
            fields
                .entry("email".into())
                .or_default()
                .push("A user with that email already exists.".into());
        }
    }
    if !fields.is_empty() {
        return Err(Error::validation(fields));
    }

    let password = hash_password(&new_user.password)?;
    let user: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password, role, date_joined)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
    ",
    )
    .bind(&new_user.email)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(password)
    .bind(UserRole::User)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    log::info!("Registered user {} ({})", user.username, user.id);
    Ok(user)
}

pub async fn login_user(
    email: &str,
    password: &str,
    signer: &SessionSigner,
    pool: &Pool<Sqlite>,
) -> Result<String, Error> {
    let Some(user) = get_user_by_email(email, pool).await? else {
        return Err(HtmlError::InvalidRequest.new("Unable to log in with provided credentials."));
    };

    if !verify_password(password, &user.password)? {
        return Err(HtmlError::InvalidRequest.new("Unable to log in with provided credentials."));
    }

    signer.generate_jwt_session(&user)
}

pub async fn set_password(
    user_id: Id,
    current_password: &str,
    new_password: &str,
    pool: &Pool<Sqlite>,
) -> Result<(), Error> {
    let user = get_user_by_id(user_id, pool)
        .await?
        .ok_or_else(Error::not_found)?;

    if !verify_password(current_password, &user.password)? {
        return Err(Error::field("current_password", "Invalid password."));
    }

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(hash_password(new_password)?)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

/// Returns false when no user has that email.
pub async fn set_user_role(email: &str, role: UserRole, pool: &Pool<Sqlite>) -> Result<bool, Error> {
    let result = sqlx::query("UPDATE users SET role = $1 WHERE email = $2")
        .bind(role)
        .bind(email)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(result.rows_affected() > 0)
}
