mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use saha_shared::models::Role;
use serde_json::json;

#[tokio::test]
async fn only_admins_create_users() {
    let app = TestApp::new();
    app.add_user("admin", Role::Admin, None).await;
    app.add_user("ayse", Role::Sorumlu, Some("Ankara")).await;
    let admin = app.login("admin").await;
    let sorumlu = app.login("ayse").await;

    let body = json!({
        "username": "can",
        "password": "uzun-parola",
        "display_name": "Can",
        "role": "koordinator",
        "unit": "Ankara"
    });

    let denied = app.post("/api/v1/users", &sorumlu, body.clone()).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let created = app.post("/api/v1/users", &admin, body.clone()).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(body_json(created).await["unit"], "Ankara");

    let duplicate = app.post("/api/v1/users", &admin, body).await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn addressable_filter_follows_policy() {
    let app = TestApp::new();
    app.add_user("admin", Role::Admin, None).await;
    app.add_user("ayse", Role::Sorumlu, Some("Ankara")).await;
    app.add_user("mehmet", Role::Sorumlu, Some("İzmir")).await;
    app.add_user("can", Role::Koordinator, Some("Ankara")).await;
    app.add_user("izzet", Role::Izleyici, None).await;
    let token = app.login("ayse").await;

    let all = body_json(app.get("/api/v1/users", &token).await).await;
    assert_eq!(all.as_array().unwrap().len(), 5);

    let addressable = body_json(app.get("/api/v1/users?addressable=true", &token).await).await;
    let names: Vec<_> = addressable
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["can"]);
}
