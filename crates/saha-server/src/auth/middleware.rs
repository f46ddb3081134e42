use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{accounts, error::AppError, routes::AppState};

use super::jwt::verify_access_token;

/// Resolve the bearer token to a stored user and attach it to the request
/// as a [`saha_shared::models::Viewer`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let claims = verify_access_token(token, &state.config.jwt_secret)?;

    // Deleted users lose access even while their token is still valid.
    let user = accounts::find(state.store.as_ref(), claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(user.viewer());

    Ok(next.run(request).await)
}
