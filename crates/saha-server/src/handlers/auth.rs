use axum::{extract::State, Extension, Json};
use saha_shared::api::{AuthResponse, LoginRequest};
use saha_shared::models::{User, Viewer};

use crate::accounts;
use crate::auth::create_access_token;
use crate::error::AppError;
use crate::routes::AppState;

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let user = accounts::authenticate(state.store.as_ref(), &req.username, &req.password).await?;

    let access_token = create_access_token(
        user.uid,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expires_in,
    )?;

    tracing::info!(user_id = %user.uid, "user logged in");

    Ok(Json(AuthResponse {
        access_token,
        expires_in: state.config.jwt_expires_in,
        user,
    }))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<User>, AppError> {
    let account = accounts::find(state.store.as_ref(), viewer.uid)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(account.user))
}
