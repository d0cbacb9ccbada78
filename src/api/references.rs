use warp::{
    filters::BoxedFilter,
    http::StatusCode,
    reject::Rejection,
    reply::Response,
    Filter,
};

use crate::{
    actions::{get_ingredient, get_tag, list_ingredients, list_tags},
    constants::QUERY_NAME,
    error::Error,
    schema::Id,
};

use super::{
    query::{with_query, QueryParams},
    routes::{json_reply, with_state, AppState},
};

/// Read-only tag and ingredient catalogues. Not paginated.
pub fn reference_routes(state: AppState) -> BoxedFilter<(Response,)> {
    let tags = warp::path!("tags")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(tag_list);

    let tag = warp::path!("tags" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(tag_detail);

    let ingredients = warp::path!("ingredients")
        .and(warp::get())
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(ingredient_list);

    let ingredient = warp::path!("ingredients" / Id)
        .and(warp::get())
        .and(with_state(state))
        .and_then(ingredient_detail);

    tags.or(tag)
        .unify()
        .or(ingredients)
        .unify()
        .or(ingredient)
        .unify()
        .boxed()
}

async fn tag_list(state: AppState) -> Result<Response, Rejection> {
    Ok(json_reply(&list_tags(&state.pool).await?, StatusCode::OK))
}

async fn tag_detail(id: Id, state: AppState) -> Result<Response, Rejection> {
    let tag = get_tag(id, &state.pool).await?.ok_or_else(Error::not_found)?;
    Ok(json_reply(&tag, StatusCode::OK))
}

async fn ingredient_list(query: QueryParams, state: AppState) -> Result<Response, Rejection> {
    let prefix = query.get(QUERY_NAME).map(str::trim).filter(|name| !name.is_empty());

    Ok(json_reply(
        &list_ingredients(prefix, &state.pool).await?,
        StatusCode::OK,
    ))
}

async fn ingredient_detail(id: Id, state: AppState) -> Result<Response, Rejection> {
    let ingredient = get_ingredient(id, &state.pool)
        .await?
        .ok_or_else(Error::not_found)?;
    Ok(json_reply(&ingredient, StatusCode::OK))
}
