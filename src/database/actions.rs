mod edges;
mod follows;
mod ingredients;
mod recipes;
mod shopping;
mod tags;
mod users;

pub use edges::*;
pub use follows::*;
pub use ingredients::*;
pub use recipes::*;
pub use shopping::*;
pub use tags::*;
pub use users::*;

use sqlx::{Pool, QueryBuilder, Sqlite};

use super::{
    error::{Error, QueryError},
    schema::Id,
};

/// Returns the ids from `ids` that have no row in `table`.
async fn missing_ids(table: &'static str, ids: &[Id], pool: &Pool<Sqlite>) -> Result<Vec<Id>, Error> {
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let mut builder = QueryBuilder::new(format!("SELECT id FROM {table} WHERE id IN ("));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let found: Vec<Id> = builder
        .build_query_scalar()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}
