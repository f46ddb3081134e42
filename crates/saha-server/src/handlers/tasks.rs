use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use saha_shared::api::{CompleteTaskRequest, CreateTaskRequest, TaskBoard};
use saha_shared::models::{Role, Task, Viewer};
use saha_shared::tasks::TaskViews;
use uuid::Uuid;

use crate::error::AppError;
use crate::routes::AppState;

/// A viewer may see a task they sent, received (directly or through their
/// unit) or wrote for themselves. Admins see everything.
fn can_view(task: &Task, viewer: &Viewer) -> bool {
    viewer.role == Role::Admin
        || task.assigned_by == viewer.uid
        || task.is_assigned_to(viewer)
        || task.is_for_unit_of(viewer)
}

/// GET /api/v1/tasks
pub async fn task_board(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<TaskBoard>, AppError> {
    let all = state.tasks.list_all().await?;
    let views = TaskViews::for_viewer(&all, &viewer);

    Ok(Json(TaskBoard {
        inbox: views.inbox(),
        unread_count: views.unread_count(),
        sent: views.sent,
        personal: views.personal,
    }))
}

/// POST /api/v1/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = state.tasks.create_task(&viewer, req.into()).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/v1/tasks/:id
///
/// Opening a task marks it read for its addressee.
pub async fn open_task(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, AppError> {
    let task = state.tasks.get(task_id).await?;
    if !can_view(&task, &viewer) {
        return Err(AppError::NotFound(format!("task {task_id}")));
    }
    Ok(Json(state.tasks.open(task_id, &viewer).await?))
}

/// POST /api/v1/tasks/:id/complete
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CompleteTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let task = state.tasks.get(task_id).await?;
    if !task.is_assigned_to(&viewer) && !task.is_for_unit_of(&viewer) {
        return Err(AppError::forbidden("only the addressee can complete a task"));
    }
    Ok(Json(state.tasks.complete(task_id, &req.note).await?))
}

/// DELETE /api/v1/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    match state.tasks.get(task_id).await {
        Ok(task) => {
            if task.assigned_by != viewer.uid && viewer.role != Role::Admin {
                return Err(AppError::forbidden("only the sender can delete a task"));
            }
            state.tasks.delete(task_id).await?;
        }
        // Already gone.
        Err(saha_shared::CoreError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(StatusCode::NO_CONTENT)
}
