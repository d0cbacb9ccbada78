use warp::{reject::Rejection, Filter};

use crate::{
    constants::{
        QUERY_AUTHOR, QUERY_FAVORITED, QUERY_LIMIT, QUERY_PAGE, QUERY_RECIPES_LIMIT,
        QUERY_SHOPPING_CART, QUERY_TAGS,
    },
    error::Error,
    filter::{parse_flag, RecipeFilter},
    pagination::PageRequest,
};

/// Query string pairs in request order. Keys may repeat.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

pub fn with_query() -> impl Filter<Extract = (QueryParams,), Error = Rejection> + Copy {
    warp::query::<Vec<(String, String)>>().map(QueryParams::from_pairs)
}

impl QueryParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Empty values count as absent.
    pub fn get_number(&self, key: &str) -> Result<Option<i64>, Error> {
        match self.get(key).map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| Error::field(key, "A valid integer is required.")),
            None => Ok(None),
        }
    }

    pub fn page_request(&self, default_limit: i64) -> Result<PageRequest, Error> {
        PageRequest::new(
            self.get_number(QUERY_PAGE)?,
            self.get_number(QUERY_LIMIT)?,
            default_limit,
        )
    }

    pub fn recipes_limit(&self) -> Result<Option<i64>, Error> {
        match self.get_number(QUERY_RECIPES_LIMIT)? {
            Some(limit) if limit < 0 => Err(Error::field(
                QUERY_RECIPES_LIMIT,
                "Ensure this value is greater than or equal to 0.",
            )),
            limit => Ok(limit),
        }
    }

    pub fn recipe_filter(&self) -> Result<RecipeFilter, Error> {
        let tags = self
            .get_all(QUERY_TAGS)
            .into_iter()
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
            .map(str::to_string)
            .collect();

        Ok(RecipeFilter {
            tags,
            author: self.get_number(QUERY_AUTHOR)?,
            is_favorited: self.flag(QUERY_FAVORITED)?,
            is_in_shopping_cart: self.flag(QUERY_SHOPPING_CART)?,
        })
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, Error> {
        match self.get(key) {
            Some(value) => parse_flag(value)
                .map(Some)
                .ok_or_else(|| Error::field(key, "Expected 1 or 0.")),
            None => Ok(None),
        }
    }

    /// `path` with the same query, pointing at another page.
    pub fn page_link(&self, path: &str, page: i64) -> String {
        let mut pairs: Vec<(&str, String)> = self
            .pairs
            .iter()
            .filter(|(k, _)| k != QUERY_PAGE)
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        pairs.push((QUERY_PAGE, page.to_string()));

        match serde_urlencoded::to_string(&pairs) {
            Ok(query) => format!("{path}?{query}"),
            Err(_) => format!("{path}?{QUERY_PAGE}={page}"),
        }
    }
}
