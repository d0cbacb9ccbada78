#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]
//! Shared setup for the HTTP integration tests: an in-memory database, a
//! temporary media directory and helpers that drive the API like a client.

use foodgram::{
    actions::{create_ingredient, create_tag},
    connection::connect_in_memory,
    jwt::SessionSigner,
    routes::{routes, AppState},
    schema::Id,
    MediaStorage,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use warp::{
    http::{Response, StatusCode},
    hyper::body::Bytes,
};

/// A 1x1 PNG.
pub const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub const PASSWORD: &str = "pepper-and-salt";

pub struct TestApp {
    pub state: AppState,
    pub media: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let pool = connect_in_memory().await.unwrap();
    let media = tempfile::tempdir().unwrap();

    let state = AppState {
        pool,
        storage: MediaStorage::new(media.path(), "/media/"),
        signer: SessionSigner::new(b"test-secret", 24).unwrap(),
        page_size: 6,
    };

    TestApp { state, media }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Bytes> {
        let mut request = warp::test::request().method(method).path(path);
        if let Some(token) = token {
            request = request.header("authorization", format!("Token {token}"));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        request.reply(&routes(self.state.clone())).await
    }

    /// Sends a request and decodes the JSON body. Empty bodies decode to `null`.
    pub async fn send(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, path, token, body).await;
        let value = if response.body().is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(response.body()).unwrap()
        };

        (response.status(), value)
    }

    /// Registers `username` and returns its id together with a fresh token.
    pub async fn register(&self, username: &str) -> (Id, String) {
        let email = format!("{username}@example.com");
        let (status, body) = self
            .send(
                "POST",
                "/api/users/",
                None,
                Some(json!({
                    "email": email,
                    "username": username,
                    "first_name": "Test",
                    "last_name": "Cook",
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        (body["id"].as_i64().unwrap(), self.login(&email, PASSWORD).await)
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/token/login/",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        body["auth_token"].as_str().unwrap().to_string()
    }

    pub async fn seed_tag(&self, name: &str, slug: &str) -> Id {
        let color = format!("#{:06X}", self.count_rows("tags").await + 1);
        create_tag(name, &color, slug, &self.state.pool).await.unwrap();
        sqlx::query_scalar("SELECT id FROM tags WHERE slug = $1")
            .bind(slug)
            .fetch_one(&self.state.pool)
            .await
            .unwrap()
    }

    pub async fn seed_ingredient(&self, name: &str, unit: &str) -> Id {
        create_ingredient(name, unit, &self.state.pool).await.unwrap();
        sqlx::query_scalar("SELECT id FROM ingredients WHERE name = $1 AND measurement_unit = $2")
            .bind(name)
            .bind(unit)
            .fetch_one(&self.state.pool)
            .await
            .unwrap()
    }

    /// Creates a recipe through the API and returns its id.
    pub async fn create_recipe(
        &self,
        token: &str,
        name: &str,
        tags: &[Id],
        ingredients: &[(Id, i64)],
    ) -> Id {
        let (status, body) = self
            .send(
                "POST",
                "/api/recipes/",
                Some(token),
                Some(recipe_payload(name, tags, ingredients)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        body["id"].as_i64().unwrap()
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.state.pool)
            .await
            .unwrap()
    }

    /// Files currently stored under the recipe image directory.
    pub fn stored_images(&self) -> usize {
        std::fs::read_dir(self.media.path().join("recipes"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn recipe_payload(name: &str, tags: &[Id], ingredients: &[(Id, i64)]) -> Value {
    json!({
        "name": name,
        "text": "Mix everything and wait.",
        "cooking_time": 10,
        "image": PIXEL,
        "tags": tags,
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({ "id": id, "amount": amount }))
            .collect::<Vec<_>>(),
    })
}
