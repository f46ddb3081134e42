mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use saha_shared::content::{serialize, Block, BlockId, BlockKind, HeadingLevel};
use saha_shared::models::Role;
use serde_json::json;

#[tokio::test]
async fn authors_create_and_everyone_reads() {
    let app = TestApp::new();
    app.add_user("ayse", Role::Sorumlu, None).await;
    app.add_user("can", Role::Koordinator, None).await;
    let author = app.login("ayse").await;
    let learner = app.login("can").await;

    let denied = app
        .post("/api/v1/trainings", &learner, json!({ "title": "Rapor" }))
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let created = app
        .post(
            "/api/v1/trainings",
            &author,
            json!({ "title": "İlk Yardım", "category": "Güvenlik" }),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let training = body_json(created).await;
    assert_eq!(training["slides"].as_array().unwrap().len(), 1);
    assert_eq!(training["slides"][0]["title"], "Introduction");
    let page_url = training["page_url"].as_str().unwrap();
    assert!(page_url.starts_with("ilk-yardim-"));

    let by_page = app
        .get(&format!("/api/v1/trainings/page/{page_url}"), &learner)
        .await;
    assert_eq!(by_page.status(), StatusCode::OK);
    assert_eq!(body_json(by_page).await["id"], training["id"]);

    let list = body_json(app.get("/api/v1/trainings", &learner).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn saved_slides_come_back_as_content() {
    let app = TestApp::new();
    app.add_user("admin", Role::Admin, None).await;
    let token = app.login("admin").await;

    let training = body_json(
        app.post("/api/v1/trainings", &token, json!({ "title": "İlk Yardım" }))
            .await,
    )
    .await;
    let id = training["id"].as_str().unwrap();

    let content = serialize(&[
        Block::new(
            BlockId(1),
            BlockKind::Heading {
                text: "Adımlar".into(),
                level: HeadingLevel::H2,
            },
        ),
        Block::new(
            BlockId(2),
            BlockKind::Paragraph {
                text: "Güvenlik önce".into(),
            },
        ),
    ]);
    let mut slides = training["slides"].clone();
    slides[0]["content"] = json!(content);

    let patched = app
        .send(
            Method::PATCH,
            &format!("/api/v1/trainings/{id}"),
            Some(&token),
            Some(json!({ "slides": slides })),
        )
        .await;
    assert_eq!(patched.status(), StatusCode::OK);

    let content_uri = format!("/api/v1/trainings/{id}/content");
    let resolved = body_json(app.get(&content_uri, &token).await).await;
    assert_eq!(resolved["source"]["kind"], "structured");
    assert_eq!(
        resolved["slides"][0]["content"],
        "<h2>Adımlar</h2><p>Güvenlik önce</p>"
    );
}

#[tokio::test]
async fn empty_slide_list_is_rejected() {
    let app = TestApp::new();
    app.add_user("admin", Role::Admin, None).await;
    let token = app.login("admin").await;
    let training = body_json(
        app.post("/api/v1/trainings", &token, json!({ "title": "Oryantasyon" }))
            .await,
    )
    .await;

    let response = app
        .send(
            Method::PATCH,
            &format!("/api/v1/trainings/{}", training["id"].as_str().unwrap()),
            Some(&token),
            Some(json!({ "slides": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_training_is_not_found() {
    let app = TestApp::new();
    app.add_user("admin", Role::Admin, None).await;
    let token = app.login("admin").await;

    let response = app
        .get(&format!("/api/v1/trainings/{}", uuid::Uuid::new_v4()), &token)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());
}
