use warp::{
    filters::BoxedFilter,
    http::StatusCode,
    reject::Rejection,
    reply::Response,
    Filter, Reply,
};

use crate::{
    actions::{
        add_edge, create_recipe, delete_recipe, fetch_recipes, fetch_shopping_list, get_recipe,
        has_cart_items, remove_edge, render_shopping_list, update_recipe,
    },
    error::{Error, HtmlError},
    form::{Form, FormData},
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    pagination::Page,
    permissions::ActionType,
    schema::{Edge, Id, Recipe},
    storage::MediaStorage,
};

use super::{
    query::{with_query, QueryParams},
    routes::{json_body, json_reply, no_content, with_state, AppState},
    serializers::{validate_recipe, Serializer, WriteMode},
};

const RECIPES_PATH: &str = "/api/recipes/";

pub fn recipe_routes(state: AppState) -> BoxedFilter<(Response,)> {
    let list = warp::path!("recipes")
        .and(warp::get())
        .and(with_possible_session(state.signer.clone()))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(state.signer.clone()))
        .and(json_body::<FormData>().map(Form::from_data))
        .and(with_state(state.clone()))
        .and_then(create_recipe_handler);

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(state.signer.clone()))
        .and(with_state(state.clone()))
        .and_then(download_shopping_cart);

    let retrieve = warp::path!("recipes" / Id)
        .and(warp::get())
        .and(with_possible_session(state.signer.clone()))
        .and(with_state(state.clone()))
        .and_then(retrieve_recipe);

    let update = warp::path!("recipes" / Id)
        .and(
            warp::put()
                .map(|| WriteMode::Replace)
                .or(warp::patch().map(|| WriteMode::Partial))
                .unify(),
        )
        .and(with_session(state.signer.clone()))
        .and(json_body::<FormData>().map(Form::from_data))
        .and(with_state(state.clone()))
        .and_then(update_recipe_handler);

    let destroy = warp::path!("recipes" / Id)
        .and(warp::delete())
        .and(with_session(state.signer.clone()))
        .and(with_state(state.clone()))
        .and_then(destroy_recipe);

    let edge = warp::path!("recipes" / Id / "favorite")
        .map(|id: Id| (id, Edge::Favorite))
        .or(warp::path!("recipes" / Id / "shopping_cart").map(|id: Id| (id, Edge::ShoppingCart)))
        .unify()
        .untuple_one();

    let add = edge
        .clone()
        .and(warp::post())
        .and(with_session(state.signer.clone()))
        .and(with_state(state.clone()))
        .and_then(add_to_list);

    let remove = edge
        .and(warp::delete())
        .and(with_session(state.signer.clone()))
        .and(with_state(state))
        .and_then(remove_from_list);

    list.or(create)
        .unify()
        .or(download)
        .unify()
        .or(retrieve)
        .unify()
        .or(update)
        .unify()
        .or(destroy)
        .unify()
        .or(add)
        .unify()
        .or(remove)
        .unify()
        .boxed()
}

async fn find_recipe(id: Id, state: &AppState) -> Result<Recipe, Error> {
    get_recipe(id, &state.pool).await?.ok_or_else(Error::not_found)
}

/// Failing to remove a file never fails the request that made it obsolete.
async fn discard_image(storage: &MediaStorage, name: &str) {
    if let Err(e) = storage.delete(name).await {
        log::warn!("Failed to remove image {name}: {e}");
    }
}

async fn list_recipes(
    session: Option<SessionData>,
    query: QueryParams,
    state: AppState,
) -> Result<Response, Rejection> {
    let viewer = session.map(|session| session.user_id);
    let filter = query.recipe_filter()?;
    let page = query.page_request(state.page_size)?;

    let (recipes, total) = fetch_recipes(&filter, viewer, page, &state.pool).await?;

    let serializer = Serializer::new(&state.pool, &state.storage, viewer);
    let mut results = Vec::with_capacity(recipes.len());
    for recipe in &recipes {
        results.push(serializer.recipe(recipe).await?);
    }

    let page = Page::from_rows(results, total, page, |n| query.page_link(RECIPES_PATH, n))?;
    Ok(json_reply(&page, StatusCode::OK))
}

async fn retrieve_recipe(
    id: Id,
    session: Option<SessionData>,
    state: AppState,
) -> Result<Response, Rejection> {
    let recipe = find_recipe(id, &state).await?;

    let serializer = Serializer::new(&state.pool, &state.storage, session.map(|s| s.user_id));
    Ok(json_reply(&serializer.recipe(&recipe).await?, StatusCode::OK))
}

async fn create_recipe_handler(
    session: SessionData,
    form: Form,
    state: AppState,
) -> Result<Response, Rejection> {
    session.authenticate(ActionType::CreateRecipes)?;

    let mut input =
        validate_recipe(&form, WriteMode::Create, session.user_id, None, &state.pool).await?;
    let image = input
        .image
        .take()
        .ok_or_else(|| Error::field("image", "This field is required."))?;

    let stored = state.storage.save_image(&image).await?;
    let result = match input.into_draft(stored.clone()) {
        Some(draft) => create_recipe(session.user_id, &draft, &state.pool).await,
        None => Err(HtmlError::InvalidRequest.new("Recipe is incomplete")),
    };

    let recipe = match result {
        Ok(recipe) => recipe,
        Err(e) => {
            discard_image(&state.storage, &stored).await;
            return Err(e.into());
        }
    };

    log::info!("User {} created recipe {}", session.user_id, recipe.id);

    let serializer = Serializer::new(&state.pool, &state.storage, Some(session.user_id));
    Ok(json_reply(&serializer.recipe(&recipe).await?, StatusCode::CREATED))
}

async fn update_recipe_handler(
    id: Id,
    mode: WriteMode,
    session: SessionData,
    form: Form,
    state: AppState,
) -> Result<Response, Rejection> {
    let recipe = find_recipe(id, &state).await?;
    session.authenticate_owner(recipe.author_id)?;

    let mut input =
        validate_recipe(&form, mode, recipe.author_id, Some(recipe.id), &state.pool).await?;

    let stored = match input.image.take() {
        Some(image) => Some(state.storage.save_image(&image).await?),
        None => None,
    };

    let changes = input.into_changes(stored.clone());
    let updated = match update_recipe(&recipe, &changes, &state.pool).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(name) = &stored {
                discard_image(&state.storage, name).await;
            }
            return Err(e.into());
        }
    };

    if stored.is_some() && updated.image != recipe.image {
        discard_image(&state.storage, &recipe.image).await;
    }

    let serializer = Serializer::new(&state.pool, &state.storage, Some(session.user_id));
    Ok(json_reply(&serializer.recipe(&updated).await?, StatusCode::OK))
}

async fn destroy_recipe(id: Id, session: SessionData, state: AppState) -> Result<Response, Rejection> {
    let recipe = find_recipe(id, &state).await?;
    session.authenticate_owner(recipe.author_id)?;

    if !delete_recipe(recipe.id, &state.pool).await? {
        return Err(Error::not_found().into());
    }
    discard_image(&state.storage, &recipe.image).await;

    log::info!("User {} deleted recipe {}", session.user_id, recipe.id);
    Ok(no_content())
}

async fn add_to_list(
    id: Id,
    edge: Edge,
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    session.authenticate(ActionType::ManageOwnLists)?;
    let recipe = find_recipe(id, &state).await?;

    add_edge(edge, session.user_id, recipe.id, &state.pool).await?;

    let serializer = Serializer::new(&state.pool, &state.storage, Some(session.user_id));
    Ok(json_reply(&serializer.recipe_short(&recipe), StatusCode::CREATED))
}

async fn remove_from_list(
    id: Id,
    edge: Edge,
    session: SessionData,
    state: AppState,
) -> Result<Response, Rejection> {
    session.authenticate(ActionType::ManageOwnLists)?;
    let recipe = find_recipe(id, &state).await?;

    remove_edge(edge, session.user_id, recipe.id, &state.pool).await?;
    Ok(no_content())
}

async fn download_shopping_cart(session: SessionData, state: AppState) -> Result<Response, Rejection> {
    session.authenticate(ActionType::ManageOwnLists)?;

    if !has_cart_items(session.user_id, &state.pool).await? {
        return Err(HtmlError::InvalidRequest.new("Shopping cart is empty").into());
    }

    let items = fetch_shopping_list(session.user_id, &state.pool).await?;
    let disposition = format!(
        "attachment; filename=\"shopping_list_{}.txt\"",
        session.username
    );

    Ok(warp::reply::with_header(
        render_shopping_list(&items),
        "content-disposition",
        disposition,
    )
    .into_response())
}
