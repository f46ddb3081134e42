#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use saha_server::{accounts, create_router, AppState, Config};
use saha_shared::api::CreateUserRequest;
use saha_shared::models::{Role, User};
use saha_shared::store::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PASSWORD: &str = "test-parola";

pub fn test_config() -> Config {
    Config {
        database_url: None,
        jwt_secret: "test-secret".to_string(),
        jwt_expires_in: 3600,
        port: 0,
        request_timeout_secs: 30,
        bootstrap_admin: None,
    }
}

/// Router over a fresh in-memory store, plus the store for seeding.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), test_config());
        Self {
            router: create_router(state),
            store,
        }
    }

    pub async fn add_user(&self, username: &str, role: Role, unit: Option<&str>) -> User {
        accounts::create(
            self.store.as_ref(),
            CreateUserRequest {
                username: username.to_string(),
                password: PASSWORD.to_string(),
                display_name: username.to_string(),
                role,
                unit: unit.map(str::to_string),
            },
        )
        .await
        .expect("seed user")
    }

    /// Log in through the API and return the bearer token.
    pub async fn login(&self, username: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["access_token"]
            .as_str()
            .expect("access_token")
            .to_string()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Response<Body> {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
