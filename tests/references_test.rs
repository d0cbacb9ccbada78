#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::spawn_app;
use foodgram::{load_ingredients, load_tags, LoadReport};
use serde_json::json;
use warp::http::StatusCode;

fn name_query(prefix: &str) -> String {
    format!(
        "/api/ingredients/?{}",
        serde_urlencoded::to_string([("name", prefix)]).unwrap()
    )
}

#[tokio::test]
async fn tags_are_listed_by_name() {
    let app = spawn_app().await;
    let lunch = app.seed_tag("Lunch", "lunch").await;
    app.seed_tag("Breakfast", "breakfast").await;

    let (status, body) = app.send("GET", "/api/tags/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["slug"], "breakfast");
    assert_eq!(body[1]["slug"], "lunch");
    assert!(body.get("count").is_none());

    let (status, body) = app.send("GET", &format!("/api/tags/{lunch}/"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Lunch");
    assert!(body["color"].as_str().unwrap().starts_with('#'));

    let (status, _) = app.send("GET", "/api/tags/9999/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ingredient_search_is_a_case_insensitive_prefix() {
    let app = spawn_app().await;
    let apricots = app.seed_ingredient("Абрикосы", "г").await;
    app.seed_ingredient("абрикосовое варенье", "г").await;
    app.seed_ingredient("Мука", "г").await;
    app.seed_ingredient("100% juice", "ml").await;

    let (status, body) = app.send("GET", &name_query("абр"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app.send("GET", &name_query("МУК"), None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = app.send("GET", &name_query("%"), None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (_, body) = app.send("GET", "/api/ingredients/", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (status, body) = app
        .send("GET", &format!("/api/ingredients/{apricots}/"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "id": apricots, "name": "Абрикосы", "measurement_unit": "г" })
    );
}

#[tokio::test]
async fn csv_loaders_skip_existing_and_malformed_rows() {
    let app = spawn_app().await;
    let dir = tempfile::tempdir().unwrap();

    let ingredients = dir.path().join("ingredients.csv");
    std::fs::write(
        &ingredients,
        "абрикосы,г\n\"соль, морская\",г\n\"rye\nflour\",g\nbroken row\n",
    )
    .unwrap();

    let first = load_ingredients(&ingredients, &app.state.pool).await.unwrap();
    assert_eq!(first, LoadReport { created: 3, skipped: 1 });

    let again = load_ingredients(&ingredients, &app.state.pool).await.unwrap();
    assert_eq!(again, LoadReport { created: 0, skipped: 4 });

    let (_, body) = app.send("GET", &name_query("rye"), None, None).await;
    assert_eq!(body[0]["name"], "rye\nflour");

    let tags = dir.path().join("tags.csv");
    std::fs::write(&tags, "Завтрак,#e26c2d,breakfast\nОбед,green,lunch\n").unwrap();

    let report = load_tags(&tags, &app.state.pool).await.unwrap();
    assert_eq!(report, LoadReport { created: 1, skipped: 1 });

    let (_, body) = app.send("GET", "/api/tags/", None, None).await;
    assert_eq!(body, json!([{ "id": body[0]["id"], "name": "Завтрак", "color": "#E26C2D", "slug": "breakfast" }]));

    assert!(load_tags(&dir.path().join("missing.csv"), &app.state.pool).await.is_err());
}
