use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use saha_shared::store::Store;
use saha_shared::tasks::TaskEngine;
use serde_json::{json, Value};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::auth::auth_middleware;
use crate::config::Config;
use crate::handlers::{
    auth as auth_handlers, tasks as task_handlers, trainings as training_handlers,
    users as user_handlers,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tasks: TaskEngine,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            tasks: TaskEngine::new(store.clone()),
            store,
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    // Public auth routes (no middleware)
    let public_auth_routes = Router::new().route("/login", post(auth_handlers::login));

    let protected_auth_routes = Router::new()
        .route("/me", get(auth_handlers::me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let auth_routes = Router::new()
        .merge(public_auth_routes)
        .merge(protected_auth_routes);

    let user_routes = Router::new()
        .route(
            "/",
            get(user_handlers::list_users).post(user_handlers::create_user),
        )
        .route("/:id", axum::routing::delete(user_handlers::delete_user));

    let training_routes = Router::new()
        .route(
            "/",
            get(training_handlers::list_trainings).post(training_handlers::create_training),
        )
        .route(
            "/page/:page_url",
            get(training_handlers::get_training_by_page),
        )
        .route(
            "/:id",
            get(training_handlers::get_training)
                .patch(training_handlers::update_training)
                .delete(training_handlers::delete_training),
        )
        .route("/:id/content", get(training_handlers::get_training_content));

    let task_routes = Router::new()
        .route(
            "/",
            get(task_handlers::task_board).post(task_handlers::create_task),
        )
        .route(
            "/:id",
            get(task_handlers::open_task).delete(task_handlers::delete_task),
        )
        .route("/:id/complete", post(task_handlers::complete_task));

    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/trainings", training_routes)
        .nest("/tasks", task_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1", protected_routes)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
