mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use saha_shared::models::Role;
use serde_json::json;

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let response = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn login_returns_token_and_profile() {
    let app = TestApp::new();
    let user = app.add_user("ayse", Role::Sorumlu, Some("Ankara")).await;
    let token = app.login("ayse").await;

    let response = app.get("/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["id"], json!(user.uid.to_string()));
    assert_eq!(me["role"], "sorumlu");
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new();
    app.add_user("ayse", Role::Sorumlu, None).await;
    let response = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "ayse", "password": "yanlis-parola" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid username or password");
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = TestApp::new();
    let missing = app.send(Method::GET, "/api/v1/tasks", None, None).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let bogus = app.get("/api/v1/tasks", "not-a-token").await;
    assert_eq!(bogus.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleted_user_token_stops_working() {
    let app = TestApp::new();
    app.add_user("admin", Role::Admin, None).await;
    let victim = app.add_user("can", Role::Koordinator, None).await;
    let admin = app.login("admin").await;
    let token = app.login("can").await;

    let response = app
        .send(
            Method::DELETE,
            &format!("/api/v1/users/{}", victim.uid),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        app.get("/api/v1/auth/me", &token).await.status(),
        StatusCode::UNAUTHORIZED
    );
}
