use warp::{
    filters::BoxedFilter,
    http::StatusCode,
    reject::Rejection,
    reply::Response,
    Filter,
};

use crate::{
    actions::{
        fetch_followed_authors, fetch_users, follow_author, get_user_by_id, login_user,
        register_user, set_password, unfollow_author,
    },
    error::{Error, FieldErrors},
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    pagination::Page,
    permissions::ActionType,
    schema::{Id, User},
};

use super::{
    query::{with_query, QueryParams},
    routes::{json_body, json_reply, no_content, with_state, AppState},
    serializers::{
        validate_new_user, validate_password, CreatedUserView, LoginRequest, SetPasswordRequest,
        Serializer, TokenView, UserCreateRequest,
    },
};

const USERS_PATH: &str = "/api/users/";
const SUBSCRIPTIONS_PATH: &str = "/api/users/subscriptions/";

pub fn user_routes(state: AppState) -> BoxedFilter<(Response,)> {
    let create = warp::path!("users")
        .and(warp::post())
        .and(json_body::<UserCreateRequest>())
        .and(with_state(state.clone()))
        .and_then(create_user);

    let list = warp::path!("users")
        .and(warp::get())
        .and(with_possible_session(state.signer.clone()))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(list_users);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session(state.signer.clone()))
        .and(with_state(state.clone()))
        .and_then(current_user);

    let password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(with_session(state.signer.clone()))
        .and(json_body::<SetPasswordRequest>())
        .and(with_state(state.clone()))
        .and_then(change_password);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(with_session(state.signer.clone()))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(list_subscriptions);

    let retrieve = warp::path!("users" / Id)
        .and(warp::get())
        .and(with_possible_session(state.signer.clone()))
        .and(with_state(state.clone()))
        .and_then(retrieve_user);

    let subscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::post())
        .and(with_session(state.signer.clone()))
        .and(with_query())
        .and(with_state(state.clone()))
        .and_then(subscribe);

    let unsubscribe = warp::path!("users" / Id / "subscribe")
        .and(warp::delete())
        .and(with_session(state.signer.clone()))
        .and(with_state(state.clone()))
        .and_then(unsubscribe);

    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(json_body::<LoginRequest>())
        .and(with_state(state.clone()))
        .and_then(login);

    let logout = warp::path!("auth" / "token" / "logout")
        .and(warp::post())
        .and(with_session(state.signer))
        .and_then(logout);

    create
        .or(list)
        .unify()
        .or(me)
        .unify()
        .or(password)
        .unify()
        .or(subscriptions)
        .unify()
        .or(retrieve)
        .unify()
        .or(subscribe)
        .unify()
        .or(unsubscribe)
        .unify()
        .or(login)
        .unify()
        .or(logout)
        .unify()
        .boxed()
}

async fn find_user(id: Id, state: &AppState) -> Result<User, Error> {
    get_user_by_id(id, &state.pool).await?.ok_or_else(Error::not_found)
}

async fn create_user(request: UserCreateRequest, state: AppState) -> Result<Response, Rejection> {
    let new_user = validate_new_user(request)?;
    let user = register_user(&new_user, &state.pool).await?;

    Ok(json_reply(&CreatedUserView::from(&user), StatusCode::CREATED))
}

async fn list_users(
    session: Option<SessionData>,
    query: QueryParams,
    state: AppState,
) -> Result<Response, Rejection> {
    let viewer = session.map(|session| session.user_id);
    let page = query.page_request(state.page_size)?;

    let (users, total) = fetch_users(page, &state.pool).await?;

    let serializer = Serializer::new(&state.pool, &state.storage, viewer);
    let mut results = Vec::with_capacity(users.len());
    for user in &users {
        results.push(serializer.user(user).await?);
    }

    let page = Page::from_rows(results, total, page, |n| query.page_link(USERS_PATH, n))?;
    Ok(json_reply(&page, StatusCode::OK))
}

async fn retrieve_user(
    id: Id,
    session: Option<SessionData>,
    state: AppState,
) -> Result<Response, Rejection> {
    let user = find_user(id, &state).await?;

    let serializer = Serializer::new(&state.pool, &state.storage, session.map(|s| s.user_id));
    Ok(json_reply(&serializer.user(&user).await?, StatusCode::OK))
}

async fn current_user(session: SessionData, state: AppState) -> Result<Response, Rejection> {
    let user = find_user(session.user_id, &state).await?;

    let serializer = Serializer::new(&state.pool, &state.storage, Some(session.user_id));
    Ok(json_reply(&serializer.user(&user).await?, StatusCode::OK))
}

async fn change_password(
    session: SessionData,
    request: SetPasswordRequest,
    state: AppState,
) -> Result<Response, Rejection> {
    let mut errors = FieldErrors::new();

    let current = request.current_password.unwrap_or_default();
    if current.is_empty() {
        errors
            .entry("current_password".into())
            .or_default()
            .push("This field is required.".into());
    }

    let new = request.new_password.unwrap_or_default();
    if new.is_empty() {
        errors
            .entry("new_password".into())
            .or_default()
            .push("This field is required.".into());
    } else {
        validate_password(&mut errors, "new_password", &new);
    }

    if !errors.is_empty() {
        return Err(Error::validation(errors).into());
    }

    set_password(session.user_id, &current, &new, &state.pool).await?;

    log::info!("User {} changed their password", session.user_id);
    Ok(no_content())
}

async fn list_subscriptions(
    session: SessionData,
    query: QueryParams,
    state: AppState,
) -> Result<Response, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    let page = query.page_request(state.page_size)?;
    let recipes_limit = query.recipes_limit()?;

    let (authors, total) = fetch_followed_authors(session.user_id, page, &state.pool).await?;

    let serializer = Serializer::new(&state.pool, &state.storage, Some(session.user_id));
    let mut results = Vec::with_capacity(authors.len());
    for author in &authors {
        results.push(serializer.subscription(author, recipes_limit).await?);
    }

    let page = Page::from_rows(results, total, page, |n| {
        query.page_link(SUBSCRIPTIONS_PATH, n)
    })?;
    Ok(json_reply(&page, StatusCode::OK))
}

async fn subscribe(
    id: Id,
    session: SessionData,
    query: QueryParams,
    state: AppState,
) -> Result<Response, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    let recipes_limit = query.recipes_limit()?;
    let author = find_user(id, &state).await?;

    follow_author(session.user_id, author.id, &state.pool).await?;

    let serializer = Serializer::new(&state.pool, &state.storage, Some(session.user_id));
    Ok(json_reply(
        &serializer.subscription(&author, recipes_limit).await?,
        StatusCode::CREATED,
    ))
}

async fn unsubscribe(id: Id, session: SessionData, state: AppState) -> Result<Response, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    let author = find_user(id, &state).await?;

    unfollow_author(session.user_id, author.id, &state.pool).await?;
    Ok(no_content())
}

async fn login(request: LoginRequest, state: AppState) -> Result<Response, Rejection> {
    let mut errors = FieldErrors::new();
    let email = request.email.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    for (field, value) in [("email", &email), ("password", &password)] {
        if value.trim().is_empty() {
            errors
                .entry(field.to_string())
                .or_default()
                .push("This field is required.".into());
        }
    }
    if !errors.is_empty() {
        return Err(Error::validation(errors).into());
    }

    let auth_token = login_user(email.trim(), &password, &state.signer, &state.pool).await?;
    Ok(json_reply(&TokenView { auth_token }, StatusCode::OK))
}

/// Tokens are stateless and expire on their own.
async fn logout(session: SessionData) -> Result<Response, Rejection> {
    log::debug!("User {} logged out", session.user_id);
    Ok(no_content())
}
