use std::convert::Infallible;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use sqlx::{Pool, Sqlite};
use warp::{
    body::BodyDeserializeError,
    http::StatusCode,
    reject::{
        InvalidQuery, LengthRequired, MethodNotAllowed, PayloadTooLarge, Rejection,
        UnsupportedMediaType,
    },
    reply::Response,
    Filter, Reply,
};

use crate::{
    config::Config,
    constants::MAX_BODY_SIZE,
    error::Error,
    jwt::SessionSigner,
    storage::MediaStorage,
};

use super::{recipes::recipe_routes, references::reference_routes, users::user_routes};

/// Everything a request handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Sqlite>,
    pub storage: MediaStorage,
    pub signer: SessionSigner,
    pub page_size: i64,
}

impl AppState {
    pub fn new(pool: Pool<Sqlite>, config: &Config) -> Result<Self, Error> {
        Ok(Self {
            pool,
            storage: MediaStorage::new(config.media_root.clone(), &config.media_url),
            signer: SessionSigner::new(config.jwt_secret.as_bytes(), config.token_lifetime_hours)?,
            page_size: config.page_size,
        })
    }
}

pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

pub fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_SIZE).and(warp::body::json())
}

pub fn json_reply<T: Serialize>(value: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(value), status).into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// The whole service: `/api/...` plus uploaded media under `/media/...`.
pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let api = warp::path("api").and(
        recipe_routes(state.clone())
            .or(user_routes(state.clone()))
            .unify()
            .or(reference_routes(state.clone()))
            .unify(),
    );

    let media = warp::path("media").and(warp::fs::dir(state.storage.root().to_path_buf()));

    api.or(media)
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (code, body) = if let Some(error) = err.find::<Error>() {
        (error.code(), error.body())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, json!({ "errors": e.to_string() }))
    } else if err.find::<InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, json!({ "errors": "Invalid query string" }))
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, json!({ "detail": "Method not allowed." }))
    } else if err.find::<PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, json!({ "detail": "Request body is too large." }))
    } else if err.find::<LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, json!({ "detail": "Content-Length header is required." }))
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, json!({ "detail": "Unsupported media type." }))
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, json!({ "detail": "Not found." }))
    } else {
        log::error!("Unhandled rejection: {err:?}");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "detail": "Internal server error" }))
    };

    Ok(json_reply(&body, code))
}
