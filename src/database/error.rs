use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

use serde_json::{json, Value};
use warp::{http::StatusCode, reject::Reject};

/// Validation messages keyed by the request field they belong to.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlError {
    InvalidRequest,
    InvalidSession,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
}

impl HtmlError {
    pub fn code(&self) -> StatusCode {
        match self {
            HtmlError::InvalidRequest => StatusCode::BAD_REQUEST,
            HtmlError::InvalidSession => StatusCode::UNAUTHORIZED,
            HtmlError::Unauthorized => StatusCode::UNAUTHORIZED,
            HtmlError::Forbidden => StatusCode::FORBIDDEN,
            HtmlError::NotFound => StatusCode::NOT_FOUND,
            HtmlError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn new(self, info: &str) -> Error {
        Error {
            kind: self,
            info: Some(info.to_string()),
            fields: None,
        }
    }
}

/// Every failure a request can end in. Rendered to JSON by the recovery filter.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {}", .info.as_deref().unwrap_or("field errors"))]
pub struct Error {
    pub kind: HtmlError,
    pub info: Option<String>,
    pub fields: Option<FieldErrors>,
}

impl Error {
    pub fn validation(fields: FieldErrors) -> Self {
        Self {
            kind: HtmlError::InvalidRequest,
            info: None,
            fields: Some(fields),
        }
    }

    pub fn field(name: &str, message: &str) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(name.to_string(), vec![message.to_string()]);
        Self::validation(fields)
    }

    pub fn not_found() -> Self {
        HtmlError::NotFound.new("Not found.")
    }

    pub fn code(&self) -> StatusCode {
        self.kind.code()
    }

    pub fn body(&self) -> Value {
        if let Some(fields) = &self.fields {
            return json!(fields);
        }

        let info = self.info.as_deref().unwrap_or_default();
        match self.kind {
            HtmlError::InvalidRequest => json!({ "errors": info }),
            _ => json!({ "detail": info }),
        }
    }
}

impl Reject for Error {}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("row not found")]
    RowNotFound,
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("pool timed out")]
    PoolTimedOut,
    #[error("{0}")]
    Other(String),
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::Database(e)
                if e.is_unique_violation()
                    || e.is_foreign_key_violation()
                    || e.is_check_violation() =>
            {
                Self::Constraint(e.message().to_string())
            }
            sqlx::Error::PoolTimedOut => Self::PoolTimedOut,
            e => Self::Other(format!("{e}")),
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        match value {
            QueryError::RowNotFound => Error::not_found(),
            QueryError::Constraint(info) => {
                log::debug!("Constraint rejected write: {info}");
                HtmlError::InvalidRequest.new("Request conflicts with existing data")
            }
            e => {
                log::error!("Database failure: {e}");
                HtmlError::Internal.new("Internal server error")
            }
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.info
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

impl From<TypeError> for Error {
    fn from(value: TypeError) -> Self {
        HtmlError::InvalidRequest.new(&value.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_render_as_keyed_lists() {
        let error = Error::field("tags", "This list may not be empty.");

        assert_eq!(error.code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.body(), json!({ "tags": ["This list may not be empty."] }));
    }

    #[test]
    fn plain_errors_use_errors_or_detail_key() {
        let conflict = HtmlError::InvalidRequest.new("Recipe is already in favorites");
        let missing = Error::not_found();

        assert_eq!(
            conflict.body(),
            json!({ "errors": "Recipe is already in favorites" })
        );
        assert_eq!(missing.body(), json!({ "detail": "Not found." }));
        assert_eq!(missing.code(), StatusCode::NOT_FOUND);
    }
}
