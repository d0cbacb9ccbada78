use warp::{reject::Rejection, Filter};

use crate::error::{Error, HtmlError};

use super::jwt::{SessionData, SessionSigner};

/// Accepts `Token <jwt>` as well as `Bearer <jwt>`.
fn parse_authorization(header: &str) -> Option<&str> {
    let header = header.trim();
    header
        .strip_prefix("Token ")
        .or_else(|| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn read_session(signer: &SessionSigner, header: Option<String>) -> Result<Option<SessionData>, Error> {
    let Some(header) = header else {
        return Ok(None);
    };

    let token = parse_authorization(&header)
        .ok_or_else(|| HtmlError::InvalidSession.new("Invalid token header."))?;

    signer
        .verify_jwt_session(token)
        .map(|session| Some(session.into()))
}

/// Anonymous requests pass with `None`; a present but invalid token is rejected.
pub fn with_possible_session(
    signer: SessionSigner,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let result = read_session(&signer, header);
        async move { result.map_err(Rejection::from) }
    })
}

pub fn with_session(
    signer: SessionSigner,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_possible_session(signer).and_then(|session: Option<SessionData>| async move {
        session.ok_or_else(|| {
            Rejection::from(
                HtmlError::Unauthorized.new("Authentication credentials were not provided."),
            )
        })
    })
}
