use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::constants::MAX_CONNECTIONS;

use super::error::{Error, QueryError};

/// Opens the database at `database_url`, creating the file if needed, and applies migrations.
pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(QueryError::from)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .map_err(QueryError::from)?;

    migrate(&pool).await?;
    log::info!("Connected to {database_url}");

    Ok(pool)
}

/// A private in-memory database. Limited to one connection that is never recycled,
/// since every sqlite memory connection is its own database.
pub async fn connect_in_memory() -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(QueryError::from)?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(QueryError::from)?;

    migrate(&pool).await?;

    Ok(pool)
}

pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| QueryError::from(sqlx::Error::from(e)))?;

    Ok(())
}
