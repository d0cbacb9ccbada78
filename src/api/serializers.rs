use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::{
    actions::{
        count_author_recipes, fetch_author_recipes, get_user_by_id, has_edge, is_following,
        list_recipe_parts, list_recipe_tags, missing_ingredient_ids, missing_tag_ids,
        recipe_name_taken,
    },
    constants::{
        EMAIL_MAX_LENGTH, MAX_AMOUNT, MAX_COOKING_TIME, MIN_AMOUNT, MIN_COOKING_TIME,
        PASSWORD_MIN_LENGTH, RECIPE_NAME_MAX_LENGTH, USER_NAME_MAX_LENGTH,
    },
    error::{Error, FieldErrors},
    form::Form,
    schema::{
        Edge, Id, IngredientAmount, NewUser, Recipe, RecipeChanges, RecipeDraft, RecipePart, Tag,
        User,
    },
    storage::{decode_data_url, DecodedImage, MediaStorage},
};

#[derive(Serialize, Debug)]
pub struct UserView {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Serialize, Debug)]
pub struct CreatedUserView {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for CreatedUserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct RecipeView {
    pub id: Id,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipePart>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

#[derive(Serialize, Debug)]
pub struct RecipeShortView {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

#[derive(Serialize, Debug)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<RecipeShortView>,
    pub recipes_count: i64,
}

/// Builds wire representations as seen by `viewer`.
pub struct Serializer<'a> {
    pool: &'a Pool<Sqlite>,
    storage: &'a MediaStorage,
    viewer: Option<Id>,
}

impl<'a> Serializer<'a> {
    pub fn new(pool: &'a Pool<Sqlite>, storage: &'a MediaStorage, viewer: Option<Id>) -> Self {
        Self {
            pool,
            storage,
            viewer,
        }
    }

    pub async fn user(&self, user: &User) -> Result<UserView, Error> {
        let is_subscribed = match self.viewer {
            Some(viewer) => is_following(viewer, user.id, self.pool).await?,
            None => false,
        };

        Ok(UserView {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        })
    }

    pub async fn recipe(&self, recipe: &Recipe) -> Result<RecipeView, Error> {
        let author = get_user_by_id(recipe.author_id, self.pool)
            .await?
            .ok_or_else(Error::not_found)?;
        let (is_favorited, is_in_shopping_cart) = match self.viewer {
            Some(viewer) => (
                has_edge(Edge::Favorite, viewer, recipe.id, self.pool).await?,
                has_edge(Edge::ShoppingCart, viewer, recipe.id, self.pool).await?,
            ),
            None => (false, false),
        };

        Ok(RecipeView {
            id: recipe.id,
            tags: list_recipe_tags(recipe.id, self.pool).await?,
            author: self.user(&author).await?,
            ingredients: list_recipe_parts(recipe.id, self.pool).await?,
            is_favorited,
            is_in_shopping_cart,
            name: recipe.name.clone(),
            image: self.storage.url(&recipe.image),
            text: recipe.text.clone(),
            cooking_time: recipe.cooking_time,
        })
    }

    pub fn recipe_short(&self, recipe: &Recipe) -> RecipeShortView {
        RecipeShortView {
            id: recipe.id,
            name: recipe.name.clone(),
            image: self.storage.url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }

    /// `recipes_limit` truncates the nested recipe list; the count stays complete.
    pub async fn subscription(
        &self,
        author: &User,
        recipes_limit: Option<i64>,
    ) -> Result<SubscriptionView, Error> {
        let recipes = fetch_author_recipes(author.id, recipes_limit, self.pool).await?;

        Ok(SubscriptionView {
            user: self.user(author).await?,
            recipes: recipes.iter().map(|recipe| self.recipe_short(recipe)).collect(),
            recipes_count: count_author_recipes(author.id, self.pool).await?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Replace,
    Partial,
}

/// A recipe payload that passed validation. The image is decoded but not yet stored.
#[derive(Debug, Default)]
pub struct RecipeInput {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    pub image: Option<DecodedImage>,
    pub tags: Option<Vec<Id>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

impl RecipeInput {
    /// `None` when a required field is missing, which validation in create mode rules out.
    pub fn into_draft(self, image: String) -> Option<RecipeDraft> {
        Some(RecipeDraft {
            name: self.name?,
            text: self.text?,
            cooking_time: self.cooking_time?,
            image,
            tags: self.tags?,
            ingredients: self.ingredients?,
        })
    }

    pub fn into_changes(self, image: Option<String>) -> RecipeChanges {
        RecipeChanges {
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
            image,
            tags: self.tags,
            ingredients: self.ingredients,
        }
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

fn required(mode: WriteMode, field: &str) -> bool {
    match mode {
        WriteMode::Create => true,
        WriteMode::Replace => field != "image",
        WriteMode::Partial => false,
    }
}

/// Checks shape, ranges and references of a recipe payload and collects every problem.
/// `author_id` and `recipe_id` scope the per-author name uniqueness check.
pub async fn validate_recipe(
    form: &Form,
    mode: WriteMode,
    author_id: Id,
    recipe_id: Option<Id>,
    pool: &Pool<Sqlite>,
) -> Result<RecipeInput, Error> {
    let mut errors = FieldErrors::new();
    let mut input = RecipeInput::default();

    for field in ["name", "text", "cooking_time", "image", "tags", "ingredients"] {
        if required(mode, field) && !form.contains(field) {
            push_error(&mut errors, field, "This field is required.");
        }
    }

    if form.contains("name") {
        match form.get_str("name") {
            Ok(name) if name.is_empty() => {
                push_error(&mut errors, "name", "This field may not be blank.")
            }
            Ok(name) if name.chars().count() > RECIPE_NAME_MAX_LENGTH => push_error(
                &mut errors,
                "name",
                format!("Ensure this field has no more than {RECIPE_NAME_MAX_LENGTH} characters."),
            ),
            Ok(name) => input.name = Some(name),
            Err(e) => push_error(&mut errors, "name", e.message()),
        }
    }

    if form.contains("text") {
        match form.get_str("text") {
            Ok(text) if text.is_empty() => {
                push_error(&mut errors, "text", "This field may not be blank.")
            }
            Ok(text) => input.text = Some(text),
            Err(e) => push_error(&mut errors, "text", e.message()),
        }
    }

    if form.contains("cooking_time") {
        match form.get_number("cooking_time") {
            Ok(time) if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&time) => push_error(
                &mut errors,
                "cooking_time",
                format!("Ensure this value is between {MIN_COOKING_TIME} and {MAX_COOKING_TIME}."),
            ),
            Ok(time) => input.cooking_time = Some(time),
            Err(e) => push_error(&mut errors, "cooking_time", e.message()),
        }
    }

    if form.contains("image") {
        match form.get_str("image").map(|payload| decode_data_url(&payload)) {
            Ok(Ok(image)) => input.image = Some(image),
            Ok(Err(e)) | Err(e) => push_error(&mut errors, "image", e.message()),
        }
    }

    if form.contains("tags") {
        match form.get_ids("tags") {
            Ok(tags) if tags.is_empty() => {
                push_error(&mut errors, "tags", "This list may not be empty.")
            }
            Ok(tags) if has_duplicates(tags.iter().copied()) => {
                push_error(&mut errors, "tags", "Tags must not repeat.")
            }
            Ok(tags) => {
                for id in missing_tag_ids(&tags, pool).await? {
                    push_error(
                        &mut errors,
                        "tags",
                        format!("Invalid pk \"{id}\" - object does not exist."),
                    );
                }
                input.tags = Some(tags);
            }
            Err(e) => push_error(&mut errors, "tags", e.message()),
        }
    }

    if form.contains("ingredients") {
        match form.get_ingredients("ingredients") {
            Ok(parts) if parts.is_empty() => {
                push_error(&mut errors, "ingredients", "This list may not be empty.")
            }
            Ok(parts) if has_duplicates(parts.iter().map(|part| part.id)) => {
                push_error(&mut errors, "ingredients", "Ingredients must not repeat.")
            }
            Ok(parts) => {
                for part in &parts {
                    if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&part.amount) {
                        push_error(
                            &mut errors,
                            "ingredients",
                            format!(
                                "Amount of ingredient {} must be between {MIN_AMOUNT} and {MAX_AMOUNT}.",
                                part.id
                            ),
                        );
                    }
                }
                let ids: Vec<Id> = parts.iter().map(|part| part.id).collect();
                for id in missing_ingredient_ids(&ids, pool).await? {
                    push_error(
                        &mut errors,
                        "ingredients",
                        format!("Invalid pk \"{id}\" - object does not exist."),
                    );
                }
                input.ingredients = Some(parts);
            }
            Err(e) => push_error(&mut errors, "ingredients", e.message()),
        }
    }

    if let Some(name) = &input.name {
        if recipe_name_taken(author_id, name, recipe_id, pool).await? {
            push_error(&mut errors, "name", "You already have a recipe with this name.");
        }
    }

    if !errors.is_empty() {
        return Err(Error::validation(errors));
    }

    Ok(input)
}

fn has_duplicates(mut ids: impl Iterator<Item = Id>) -> bool {
    let mut seen = HashSet::new();
    ids.any(|id| !seen.insert(id))
}

#[derive(Deserialize, Debug)]
pub struct UserCreateRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SetPasswordRequest {
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct TokenView {
    pub auth_token: String,
}

fn required_text(errors: &mut FieldErrors, field: &str, value: &Option<String>, max: usize) -> String {
    let value = value.as_deref().map(str::trim).unwrap_or_default();
    if value.is_empty() {
        push_error(errors, field, "This field is required.");
    } else if value.chars().count() > max {
        push_error(errors, field, format!("Ensure this field has no more than {max} characters."));
    }
    value.to_string()
}

pub fn validate_password(errors: &mut FieldErrors, field: &str, password: &str) {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        push_error(
            errors,
            field,
            format!("This password is too short. It must contain at least {PASSWORD_MIN_LENGTH} characters."),
        );
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        push_error(errors, field, "This password is entirely numeric.");
    }
}

pub fn validate_new_user(request: UserCreateRequest) -> Result<NewUser, Error> {
    let mut errors = FieldErrors::new();

    let email = required_text(&mut errors, "email", &request.email, EMAIL_MAX_LENGTH);
    if !email.is_empty() && !is_email(&email) {
        push_error(&mut errors, "email", "Enter a valid email address.");
    }

    let username = required_text(&mut errors, "username", &request.username, USER_NAME_MAX_LENGTH);
    if !username.is_empty()
        && !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        push_error(
            &mut errors,
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
    if username.eq_ignore_ascii_case("me") {
        push_error(&mut errors, "username", "This username is reserved.");
    }

    let first_name = required_text(&mut errors, "first_name", &request.first_name, USER_NAME_MAX_LENGTH);
    let last_name = required_text(&mut errors, "last_name", &request.last_name, USER_NAME_MAX_LENGTH);

    let password = request.password.unwrap_or_default();
    if password.is_empty() {
        push_error(&mut errors, "password", "This field is required.");
    } else {
        validate_password(&mut errors, "password", &password);
    }

    if !errors.is_empty() {
        return Err(Error::validation(errors));
    }

    Ok(NewUser {
        email,
        username,
        first_name,
        last_name,
        password,
    })
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
