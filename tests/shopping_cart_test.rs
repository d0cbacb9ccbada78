#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::spawn_app;
use serde_json::json;
use warp::http::StatusCode;

#[tokio::test]
async fn shopping_list_sums_matching_ingredients() {
    let app = spawn_app().await;
    let (_, token) = app.register("cook").await;
    let tag = app.seed_tag("Baking", "baking").await;
    let salt = app.seed_ingredient("Salt", "g").await;
    let flour = app.seed_ingredient("Flour", "g").await;

    let bread = app
        .create_recipe(&token, "Bread", &[tag], &[(salt, 5), (flour, 200)])
        .await;
    let crackers = app.create_recipe(&token, "Crackers", &[tag], &[(salt, 3)]).await;

    for id in [bread, crackers] {
        let (status, body) = app
            .send("POST", &format!("/api/recipes/{id}/shopping_cart/"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["id"], id);
        assert!(body.get("text").is_none());
    }

    let response = app
        .request("GET", "/api/recipes/download_shopping_cart/", Some(&token), None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"shopping_list_cook.txt\""
    );
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(
        std::str::from_utf8(response.body()).unwrap(),
        "Flour 200 - (g)\nSalt 8 - (g)\n"
    );
}

#[tokio::test]
async fn empty_cart_cannot_be_downloaded() {
    let app = spawn_app().await;
    let (_, token) = app.register("cook").await;

    let (status, body) = app
        .send("GET", "/api/recipes/download_shopping_cart/", Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": "Shopping cart is empty" }));

    let (status, _) = app
        .send("GET", "/api/recipes/download_shopping_cart/", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lists_reject_duplicates_and_missing_entries() {
    let app = spawn_app().await;
    let (_, token) = app.register("cook").await;
    let tag = app.seed_tag("Baking", "baking").await;
    let salt = app.seed_ingredient("Salt", "g").await;
    let id = app.create_recipe(&token, "Crackers", &[tag], &[(salt, 3)]).await;
    let path = format!("/api/recipes/{id}/favorite/");

    let (status, _) = app.send("POST", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.send("POST", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": "Recipe is already in favorites" }));

    let (status, _) = app.send("DELETE", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send("DELETE", &path, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": "Recipe is not in favorites" }));

    let (status, _) = app
        .send("POST", "/api/recipes/9999/favorite/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_favorites_store_one_row() {
    let app = spawn_app().await;
    let (_, token) = app.register("cook").await;
    let tag = app.seed_tag("Baking", "baking").await;
    let salt = app.seed_ingredient("Salt", "g").await;
    let id = app.create_recipe(&token, "Crackers", &[tag], &[(salt, 3)]).await;
    let path = format!("/api/recipes/{id}/favorite/");

    let (first, second) = tokio::join!(
        app.send("POST", &path, Some(&token), None),
        app.send("POST", &path, Some(&token), None),
    );

    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    assert_eq!(app.count_rows("favorites").await, 1);
}

#[tokio::test]
async fn flags_follow_the_viewer() {
    let app = spawn_app().await;
    let (_, cook) = app.register("cook").await;
    let (_, guest) = app.register("guest").await;
    let tag = app.seed_tag("Baking", "baking").await;
    let salt = app.seed_ingredient("Salt", "g").await;
    let liked = app.create_recipe(&cook, "Crackers", &[tag], &[(salt, 3)]).await;
    app.create_recipe(&cook, "Pretzels", &[tag], &[(salt, 4)]).await;

    app.send("POST", &format!("/api/recipes/{liked}/favorite/"), Some(&guest), None)
        .await;

    let (_, body) = app
        .send("GET", "/api/recipes/?is_favorited=1", Some(&guest), None)
        .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], liked);
    assert_eq!(body["results"][0]["is_favorited"], true);

    let (_, body) = app
        .send("GET", "/api/recipes/?is_favorited=0", Some(&guest), None)
        .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Pretzels");

    let (_, body) = app
        .send("GET", &format!("/api/recipes/{liked}/"), Some(&cook), None)
        .await;
    assert_eq!(body["is_favorited"], false);
}

#[tokio::test]
async fn deleting_a_recipe_clears_it_from_carts() {
    let app = spawn_app().await;
    let (_, token) = app.register("cook").await;
    let tag = app.seed_tag("Baking", "baking").await;
    let salt = app.seed_ingredient("Salt", "g").await;
    let id = app.create_recipe(&token, "Crackers", &[tag], &[(salt, 3)]).await;

    app.send("POST", &format!("/api/recipes/{id}/shopping_cart/"), Some(&token), None)
        .await;
    app.send("DELETE", &format!("/api/recipes/{id}/"), Some(&token), None)
        .await;

    assert_eq!(app.count_rows("shopping_cart").await, 0);
    let (status, _) = app
        .send("GET", "/api/recipes/download_shopping_cart/", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cart_filter_applies_only_to_signed_in_viewers() {
    let app = spawn_app().await;
    let (_, token) = app.register("cook").await;
    let breakfast = app.seed_tag("Breakfast", "breakfast").await;
    let dinner = app.seed_tag("Dinner", "dinner").await;
    let eggs = app.seed_ingredient("Eggs", "pcs").await;

    let omelette = app.create_recipe(&token, "Omelette", &[breakfast], &[(eggs, 3)]).await;
    let frittata = app.create_recipe(&token, "Frittata", &[dinner], &[(eggs, 6)]).await;
    app.create_recipe(&token, "Shakshuka", &[breakfast], &[(eggs, 4)]).await;

    for id in [omelette, frittata] {
        let (status, _) = app
            .send("POST", &format!("/api/recipes/{id}/shopping_cart/"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let names = |body: &serde_json::Value| -> Vec<String> {
        body["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|recipe| recipe["name"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, body) = app
        .send("GET", "/api/recipes/?is_in_shopping_cart=1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Frittata", "Omelette"]);
    assert!(body["results"]
        .as_array()
        .unwrap()
        .iter()
        .all(|recipe| recipe["is_in_shopping_cart"] == true));

    let (_, body) = app
        .send("GET", "/api/recipes/?is_in_shopping_cart=0", Some(&token), None)
        .await;
    assert_eq!(names(&body), vec!["Shakshuka"]);
    assert_eq!(body["results"][0]["is_in_shopping_cart"], false);

    let (status, body) = app
        .send("GET", "/api/recipes/?is_in_shopping_cart=1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);

    let (_, body) = app
        .send(
            "GET",
            "/api/recipes/?tags=breakfast&is_in_shopping_cart=1",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(names(&body), vec!["Omelette"]);

    let (_, body) = app
        .send(
            "GET",
            "/api/recipes/?tags=breakfast&is_in_shopping_cart=0",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(names(&body), vec!["Shakshuka"]);
}
