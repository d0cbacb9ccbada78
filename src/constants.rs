pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const MAX_CONNECTIONS: u32 = 8;
pub const MAX_BODY_SIZE: u64 = 10 * 1024 * 1024;

pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;
pub const MAX_TOKEN_LIFETIME_HOURS: i64 = 24 * 365;

pub const RECIPE_NAME_MAX_LENGTH: usize = 200;
pub const USER_NAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const PASSWORD_MIN_LENGTH: usize = 8;

pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 32_000;
pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 32_000;

pub const RECIPE_IMAGE_DIR: &str = "recipes";

/// Accepted image types of uploaded data URLs and the extension they are stored with.
pub const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

pub const QUERY_TAGS: &str = "tags";
pub const QUERY_AUTHOR: &str = "author";
pub const QUERY_FAVORITED: &str = "is_favorited";
pub const QUERY_SHOPPING_CART: &str = "is_in_shopping_cart";
pub const QUERY_NAME: &str = "name";
pub const QUERY_RECIPES_LIMIT: &str = "recipes_limit";
pub const QUERY_PAGE: &str = "page";
pub const QUERY_LIMIT: &str = "limit";
