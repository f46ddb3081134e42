use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use saha_shared::api::{CreateUserRequest, UserListParams};
use saha_shared::models::{User, Viewer};
use saha_shared::policy;
use uuid::Uuid;

use crate::accounts;
use crate::error::AppError;
use crate::routes::AppState;

fn require_user_admin(viewer: &Viewer) -> Result<(), AppError> {
    if !viewer.role.can_manage_users() {
        return Err(AppError::forbidden("only admins can manage users"));
    }
    Ok(())
}

/// GET /api/v1/users
///
/// With `addressable=true`, only users the caller may send a task to.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(params): Query<UserListParams>,
) -> Result<Json<Vec<User>>, AppError> {
    let mut users = accounts::list(state.store.as_ref()).await?;
    if params.addressable {
        users.retain(|u| u.uid != viewer.uid && policy::can_address(viewer.role, u.role));
    }
    Ok(Json(users))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    require_user_admin(&viewer)?;
    let user = accounts::create(state.store.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// DELETE /api/v1/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_user_admin(&viewer)?;
    if user_id == viewer.uid {
        return Err(AppError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }
    accounts::delete(state.store.as_ref(), user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
